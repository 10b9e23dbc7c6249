pub mod config;
pub mod domain;
pub mod errors;
pub mod suggestions;

pub use domain::body_area::{BodyArea, BodyAreaId};
pub use domain::exercise::{CatalogExercise, Exercise, ExerciseId};
pub use domain::plan::{
    FocusArea, FocusAreaDraft, FocusAreaId, NewFocusArea, NewPlan, PlanDraft, PlanId,
    PlanWithFocusAreas, PtsType, WorkoutPlan,
};
pub use domain::user::{User, UserId};
pub use domain::workout::{
    ActiveWorkout, SetId, SetWithDetails, Workout, WorkoutId, WorkoutSet, WorkoutWithSets,
};
pub use errors::DomainError;
pub use suggestions::{FocusAreaSuggestion, SuggestionEngine, SuggestionInput};
