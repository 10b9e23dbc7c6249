//! Suggestion Engine implementation

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::scoring::{round_to_hundredths, ScoreCalculator, ScoringWeights};
use super::types::*;
use crate::domain::exercise::Exercise;
use crate::domain::plan::FocusArea;

/// Ranks a plan's focus areas by urgency.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    calculator: ScoreCalculator,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self { calculator: ScoreCalculator::new() }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { calculator: ScoreCalculator::with_weights(weights) }
    }

    /// Score every focus area in `input` as of `today` and return them in
    /// descending priority. Ties keep input order.
    pub fn compute_suggestions(
        &self,
        input: &SuggestionInput,
        today: NaiveDate,
    ) -> Vec<FocusAreaSuggestion> {
        let mut suggestions: Vec<FocusAreaSuggestion> = input
            .focus_areas
            .iter()
            .map(|focus_area| self.score_focus_area(input, focus_area, today))
            .collect();

        suggestions.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        suggestions
    }

    fn score_focus_area(
        &self,
        input: &SuggestionInput,
        focus_area: &FocusArea,
        today: NaiveDate,
    ) -> FocusAreaSuggestion {
        let pts_fulfilled =
            input.fulfillment_by_focus_area.get(&focus_area.id).copied().unwrap_or(0);
        let last_done = input.last_done_by_body_area.get(&focus_area.body_area_id).copied();
        let days_since_last = ScoreCalculator::days_since(last_done, today);

        let fulfillment_fraction =
            ScoreCalculator::fulfillment_fraction(pts_fulfilled, focus_area.pts_per_period);
        let overdue_fraction =
            ScoreCalculator::overdue_fraction(days_since_last, focus_area.period_length_days);
        let priority = self.calculator.priority(fulfillment_fraction, overdue_fraction);

        let exercises = input
            .exercises_by_body_area
            .get(&focus_area.body_area_id)
            .map(|exercises| rank_exercises(input, exercises, today))
            .unwrap_or_default();

        FocusAreaSuggestion {
            focus_area: SuggestedFocusArea::from(focus_area),
            pts_fulfilled,
            days_since_last,
            overdue_fraction: round_to_hundredths(overdue_fraction),
            fulfillment_fraction: round_to_hundredths(fulfillment_fraction),
            priority: round_to_hundredths(priority),
            exercises,
        }
    }
}

/// Never-performed exercises first, then the longest-neglected.
fn rank_exercises(
    input: &SuggestionInput,
    exercises: &[Exercise],
    today: NaiveDate,
) -> Vec<ExerciseRecency> {
    let mut ranked: Vec<ExerciseRecency> = exercises
        .iter()
        .map(|exercise| ExerciseRecency {
            id: exercise.id,
            body_area_id: exercise.body_area_id,
            name: exercise.name.clone(),
            days_since_last: ScoreCalculator::days_since(
                input.exercise_last_done.get(&exercise.id).copied(),
                today,
            ),
        })
        .collect();

    ranked.sort_by(|a, b| match (a.days_since_last, b.days_since_last) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_days), Some(b_days)) => b_days.cmp(&a_days),
    });
    ranked
}
