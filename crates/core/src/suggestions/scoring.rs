//! Scoring arithmetic for focus area suggestions

use chrono::NaiveDate;

use super::NEVER_DONE_OVERDUE;

/// Weights for scoring components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Weight for the unfulfilled share of the period target (default: 2.0)
    pub points_deficit: f64,
    /// Weight for the overdue fraction (default: 3.0)
    pub overdue: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Score calculator for focus areas
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCalculator {
    /// Create a new score calculator with default weights
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default() }
    }

    /// Create with custom weights
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Whole calendar days between `last_done` and `today`.
    ///
    /// Dates later than `today` count as zero days.
    pub fn days_since(last_done: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
        last_done.map(|date| (today - date).num_days().max(0))
    }

    /// Share of the period target already logged. Not clamped, so values
    /// above 1.0 mean the target was exceeded.
    ///
    /// A zero target counts as met once any points are logged.
    pub fn fulfillment_fraction(pts_fulfilled: u64, pts_per_period: u32) -> f64 {
        if pts_per_period == 0 {
            return if pts_fulfilled > 0 { 1.0 } else { 0.0 };
        }

        pts_fulfilled as f64 / f64::from(pts_per_period)
    }

    /// How far past its rolling period the area was last trained, in
    /// multiples of the period. Zero while inside the period.
    pub fn overdue_fraction(days_since_last: Option<i64>, period_length_days: u32) -> f64 {
        match days_since_last {
            None => NEVER_DONE_OVERDUE,
            Some(days) => {
                let period = f64::from(period_length_days.max(1));
                ((days as f64 - period) / period).max(0.0)
            }
        }
    }

    /// Composite urgency: weighted points deficit plus weighted overdueness.
    pub fn priority(&self, fulfillment_fraction: f64, overdue_fraction: f64) -> f64 {
        let unfulfilled = (1.0 - fulfillment_fraction).max(0.0);
        unfulfilled * self.weights.points_deficit + overdue_fraction * self.weights.overdue
    }
}

/// Round to two decimal places for stable output.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{round_to_hundredths, ScoreCalculator, ScoringWeights};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date")
    }

    #[test]
    fn days_since_counts_calendar_days() {
        assert_eq!(ScoreCalculator::days_since(Some(date(1)), date(11)), Some(10));
        assert_eq!(ScoreCalculator::days_since(Some(date(11)), date(11)), Some(0));
        assert_eq!(ScoreCalculator::days_since(None, date(11)), None);
    }

    #[test]
    fn future_dates_clamp_to_zero_days() {
        assert_eq!(ScoreCalculator::days_since(Some(date(20)), date(11)), Some(0));
    }

    #[test]
    fn fulfillment_is_not_clamped() {
        assert_eq!(ScoreCalculator::fulfillment_fraction(0, 3), 0.0);
        assert_eq!(ScoreCalculator::fulfillment_fraction(3, 3), 1.0);
        assert_eq!(ScoreCalculator::fulfillment_fraction(6, 3), 2.0);
    }

    #[test]
    fn zero_target_never_produces_nan() {
        assert_eq!(ScoreCalculator::fulfillment_fraction(0, 0), 0.0);
        assert_eq!(ScoreCalculator::fulfillment_fraction(5, 0), 1.0);

        let overdue = ScoreCalculator::overdue_fraction(Some(3), 0);
        assert!(overdue.is_finite());
        assert_eq!(overdue, 2.0);
    }

    #[test]
    fn overdue_is_zero_inside_the_period() {
        assert_eq!(ScoreCalculator::overdue_fraction(Some(0), 7), 0.0);
        assert_eq!(ScoreCalculator::overdue_fraction(Some(7), 7), 0.0);
        assert_eq!(ScoreCalculator::overdue_fraction(Some(14), 7), 1.0);
        assert_eq!(ScoreCalculator::overdue_fraction(None, 7), 2.0);
    }

    #[test]
    fn priority_weights_deficit_and_overdue() {
        let calculator = ScoreCalculator::new();
        assert_eq!(calculator.priority(0.0, 2.0), 8.0);
        assert_eq!(calculator.priority(1.5, 0.0), 0.0);
        assert_eq!(calculator.priority(0.5, 1.0), 4.0);

        let custom =
            ScoreCalculator::with_weights(ScoringWeights { points_deficit: 1.0, overdue: 1.0 });
        assert_eq!(custom.priority(0.5, 1.0), 1.5);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_hundredths(3.0 / 7.0), 0.43);
        assert_eq!(round_to_hundredths(9.0 / 7.0), 1.29);
        assert_eq!(round_to_hundredths(2.0 / 3.0), 0.67);
    }
}
