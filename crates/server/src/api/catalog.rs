use axum::{extract::State, Json};
use trainwise_core::domain::body_area::BodyArea;
use trainwise_core::domain::exercise::CatalogExercise;

use super::{repository_error, ApiError, AppState};

pub async fn list_body_areas(
    State(state): State<AppState>,
) -> Result<Json<Vec<BodyArea>>, ApiError> {
    let body_areas = state
        .catalog
        .list_body_areas()
        .await
        .map_err(repository_error("list_body_areas", "Failed to fetch body areas"))?;
    Ok(Json(body_areas))
}

pub async fn list_exercises(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogExercise>>, ApiError> {
    let exercises = state
        .catalog
        .list_exercises()
        .await
        .map_err(repository_error("list_exercises", "Failed to fetch exercises"))?;
    Ok(Json(exercises))
}
