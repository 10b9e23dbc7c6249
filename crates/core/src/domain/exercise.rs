use serde::{Deserialize, Serialize};

use crate::domain::body_area::BodyAreaId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub body_area_id: BodyAreaId,
    pub name: String,
}

/// Catalog listing row: an exercise joined with its body area name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub body_area_name: String,
}
