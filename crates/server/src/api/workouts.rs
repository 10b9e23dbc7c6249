use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use trainwise_core::domain::user::UserId;
use trainwise_core::domain::workout::{
    parse_workout_date, ActiveWorkout, Workout, WorkoutId, WorkoutWithSets,
};
use trainwise_core::errors::DomainError;

use super::{
    not_found, repository_error, today, validation_error, ApiError, AppState, OkResponse,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDateRequest {
    #[serde(default)]
    pub workout_date: Option<String>,
}

pub async fn start_workout(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<WorkoutDateRequest>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let workout_date = match body.workout_date.as_deref() {
        Some(raw) => parse_workout_date(raw).map_err(validation_error)?,
        None => today(),
    };

    let workout = state
        .workouts
        .start(UserId(user_id), workout_date, Utc::now())
        .await
        .map_err(repository_error("start_workout", "Failed to start workout"))?
        .ok_or_else(|| not_found("User not found"))?;

    info!(
        event_name = "api.workout.started",
        correlation_id = %workout.id.0,
        user_id,
        workout_date = %workout.workout_date,
        "workout started"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn finish_workout(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Workout>, ApiError> {
    let workout = state
        .workouts
        .finish(WorkoutId(id), Utc::now())
        .await
        .map_err(repository_error("finish_workout", "Failed to finish workout"))?
        .ok_or_else(|| not_found("Active workout not found"))?;

    info!(event_name = "api.workout.finished", correlation_id = %id, "workout finished");
    Ok(Json(workout))
}

pub async fn abort_workout(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let aborted = state
        .workouts
        .abort(WorkoutId(id))
        .await
        .map_err(repository_error("abort_workout", "Failed to abort workout"))?;
    if !aborted {
        return Err(not_found("Active workout not found"));
    }

    info!(event_name = "api.workout.aborted", correlation_id = %id, "workout aborted");
    Ok(OkResponse::ok())
}

pub async fn active_workout(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Option<ActiveWorkout>>, ApiError> {
    let active = state
        .workouts
        .active_for_user(UserId(user_id))
        .await
        .map_err(repository_error("active_workout", "Failed to fetch active workout"))?;
    Ok(Json(active))
}

pub async fn update_workout(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<WorkoutDateRequest>,
) -> Result<Json<Workout>, ApiError> {
    let raw = body
        .workout_date
        .ok_or_else(|| validation_error(DomainError::MissingField { field: "workoutDate" }))?;
    let workout_date = parse_workout_date(&raw).map_err(validation_error)?;

    let workout = state
        .workouts
        .update_date(WorkoutId(id), workout_date)
        .await
        .map_err(repository_error("update_workout", "Failed to update workout"))?
        .ok_or_else(|| not_found("Finished workout not found"))?;
    Ok(Json(workout))
}

pub async fn delete_workout(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let deleted = state
        .workouts
        .delete_finished(WorkoutId(id))
        .await
        .map_err(repository_error("delete_workout", "Failed to delete workout"))?;
    if !deleted {
        return Err(not_found("Finished workout not found"));
    }
    Ok(OkResponse::ok())
}

pub async fn history(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkoutWithSets>>, ApiError> {
    let workouts = state
        .workouts
        .history(UserId(user_id))
        .await
        .map_err(repository_error("history", "Failed to fetch history"))?;
    Ok(Json(workouts))
}
