//! Types for the Suggestion Engine

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::body_area::{BodyArea, BodyAreaId};
use crate::domain::exercise::{Exercise, ExerciseId};
use crate::domain::plan::{FocusArea, FocusAreaId, PtsType};

/// Snapshot of everything the engine reads for one plan.
///
/// A missing map entry means "no points", "never trained", or "no exercises"
/// respectively.
#[derive(Debug, Clone, Default)]
pub struct SuggestionInput {
    /// Focus areas of exactly one plan
    pub focus_areas: Vec<FocusArea>,
    /// Points logged inside each focus area's rolling window
    pub fulfillment_by_focus_area: HashMap<FocusAreaId, u64>,
    /// Latest finished workout date that touched each body area
    pub last_done_by_body_area: HashMap<BodyAreaId, NaiveDate>,
    /// Catalog exercises grouped by body area, in store order
    pub exercises_by_body_area: HashMap<BodyAreaId, Vec<Exercise>>,
    /// Latest finished workout date per exercise
    pub exercise_last_done: HashMap<ExerciseId, NaiveDate>,
}

impl SuggestionInput {
    pub fn new(focus_areas: Vec<FocusArea>) -> Self {
        Self { focus_areas, ..Self::default() }
    }

    pub fn with_points(mut self, focus_area: FocusAreaId, pts: u64) -> Self {
        self.fulfillment_by_focus_area.insert(focus_area, pts);
        self
    }

    pub fn with_body_area_last_done(mut self, body_area: BodyAreaId, date: NaiveDate) -> Self {
        self.last_done_by_body_area.insert(body_area, date);
        self
    }

    pub fn with_exercise(mut self, exercise: Exercise, last_done: Option<NaiveDate>) -> Self {
        if let Some(date) = last_done {
            self.exercise_last_done.insert(exercise.id, date);
        }
        self.exercises_by_body_area.entry(exercise.body_area_id).or_default().push(exercise);
        self
    }
}

/// Focus area as presented alongside its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFocusArea {
    pub id: FocusAreaId,
    pub body_area: BodyArea,
    pub pts_per_period: u32,
    pub pts_type: PtsType,
    pub period_length_days: u32,
    pub color_index: Option<u32>,
}

impl From<&FocusArea> for SuggestedFocusArea {
    fn from(focus_area: &FocusArea) -> Self {
        Self {
            id: focus_area.id,
            body_area: focus_area.body_area(),
            pts_per_period: focus_area.pts_per_period,
            pts_type: focus_area.pts_type,
            period_length_days: focus_area.period_length_days,
            color_index: focus_area.color_index,
        }
    }
}

/// An exercise annotated with how long ago it was last performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecency {
    pub id: ExerciseId,
    pub body_area_id: BodyAreaId,
    pub name: String,
    /// `None` when the exercise has never been part of a finished workout
    pub days_since_last: Option<i64>,
}

/// One ranked entry of the engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreaSuggestion {
    pub focus_area: SuggestedFocusArea,
    pub pts_fulfilled: u64,
    pub days_since_last: Option<i64>,
    pub overdue_fraction: f64,
    pub fulfillment_fraction: f64,
    pub priority: f64,
    pub exercises: Vec<ExerciseRecency>,
}
