use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::exercise::ExerciseId;
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetId(pub i64);

/// Calendar date format used on the wire and in storage.
pub const WORKOUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A training session. Starts unfinished, is finished at most once, and may
/// only be aborted (deleted) while unfinished. Only finished workouts count
/// toward suggestions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub user_id: UserId,
    pub workout_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub finished: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: SetId,
    pub workout_id: WorkoutId,
    pub exercise_id: ExerciseId,
    pub pts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWithDetails {
    #[serde(flatten)]
    pub set: WorkoutSet,
    pub exercise_name: String,
    pub body_area_name: String,
}

/// The user's unfinished workout together with its logged sets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWorkout {
    pub workout: Workout,
    pub sets: Vec<SetWithDetails>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutWithSets {
    #[serde(flatten)]
    pub workout: Workout,
    pub sets: Vec<SetWithDetails>,
}

pub fn parse_workout_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), WORKOUT_DATE_FORMAT).map_err(|_| {
        DomainError::OutOfRange { field: "workoutDate", requirement: "a YYYY-MM-DD date" }
    })
}

/// Points must be present and non-negative.
pub fn validate_pts(raw: Option<i64>) -> Result<u32, DomainError> {
    match raw {
        None => Err(DomainError::MissingField { field: "pts" }),
        Some(value) => u32::try_from(value).map_err(|_| DomainError::OutOfRange {
            field: "pts",
            requirement: "a non-negative integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_workout_date, validate_pts};
    use crate::errors::DomainError;

    #[test]
    fn parses_calendar_dates() {
        assert_eq!(parse_workout_date("2025-03-09"), Ok(NaiveDate::from_ymd_opt(2025, 3, 9).expect("date")));
        assert!(parse_workout_date("03/09/2025").is_err());
        assert!(parse_workout_date("2025-02-30").is_err());
    }

    #[test]
    fn pts_must_be_non_negative() {
        assert_eq!(validate_pts(Some(0)), Ok(0));
        assert_eq!(validate_pts(Some(45)), Ok(45));
        assert!(matches!(validate_pts(Some(-1)), Err(DomainError::OutOfRange { field: "pts", .. })));
        assert_eq!(validate_pts(None), Err(DomainError::MissingField { field: "pts" }));
    }
}
