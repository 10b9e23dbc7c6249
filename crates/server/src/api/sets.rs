use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use trainwise_core::domain::exercise::ExerciseId;
use trainwise_core::domain::workout::{validate_pts, SetId, WorkoutId, WorkoutSet};
use trainwise_db::repositories::SetInsert;

use super::{
    api_error, not_found, repository_error, validation_error, ApiError, AppState, OkResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSetRequest {
    #[serde(default)]
    pub exercise_id: Option<i64>,
    #[serde(default)]
    pub pts: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSetRequest {
    #[serde(default)]
    pub pts: Option<i64>,
}

pub async fn add_set(
    Path(workout_id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<AddSetRequest>,
) -> Result<(StatusCode, Json<WorkoutSet>), ApiError> {
    let (Some(exercise_id), Some(_)) = (body.exercise_id, body.pts) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "exerciseId and pts are required"));
    };
    let pts = validate_pts(body.pts).map_err(validation_error)?;

    let outcome = state
        .workouts
        .add_set(WorkoutId(workout_id), ExerciseId(exercise_id), pts)
        .await
        .map_err(repository_error("add_set", "Failed to add set"))?;

    match outcome {
        SetInsert::Added(set) => Ok((StatusCode::CREATED, Json(set))),
        SetInsert::WorkoutNotActive => Err(not_found("Active workout not found")),
        SetInsert::UnknownExercise => Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("exercise {exercise_id} does not exist"),
        )),
    }
}

pub async fn update_set(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateSetRequest>,
) -> Result<Json<WorkoutSet>, ApiError> {
    let pts = validate_pts(body.pts).map_err(validation_error)?;

    let set = state
        .workouts
        .update_set_pts(SetId(id), pts)
        .await
        .map_err(repository_error("update_set", "Failed to update set"))?
        .ok_or_else(|| not_found("Set not found"))?;
    Ok(Json(set))
}

pub async fn delete_set(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let deleted = state
        .workouts
        .delete_set(SetId(id))
        .await
        .map_err(repository_error("delete_set", "Failed to remove set"))?;
    if !deleted {
        return Err(not_found("Set not found"));
    }
    Ok(OkResponse::ok())
}
