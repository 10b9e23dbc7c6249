//! JSON API for the workout tracker.
//!
//! Request bodies use camelCase field names. Stored rows are returned with
//! their column names; suggestion payloads are camelCase throughout. Every
//! error response is `{ "error": "<message>" }`.

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{any, get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use trainwise_core::errors::DomainError;
use trainwise_core::suggestions::SuggestionEngine;
use trainwise_db::repositories::{
    CatalogRepository, PlanRepository, RepositoryError, SqlCatalogRepository, SqlPlanRepository,
    SqlSuggestionStore, SqlUserRepository, SqlWorkoutRepository, SuggestionStore, UserRepository,
    WorkoutRepository,
};
use trainwise_db::DbPool;

mod catalog;
mod plans;
mod sets;
mod suggestions;
mod users;
mod workouts;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub workouts: Arc<dyn WorkoutRepository>,
    pub suggestion_store: Arc<dyn SuggestionStore>,
    pub engine: Arc<SuggestionEngine>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            users: Arc::new(SqlUserRepository::new(db_pool.clone())),
            catalog: Arc::new(SqlCatalogRepository::new(db_pool.clone())),
            plans: Arc::new(SqlPlanRepository::new(db_pool.clone())),
            workouts: Arc::new(SqlWorkoutRepository::new(db_pool.clone())),
            suggestion_store: Arc::new(SqlSuggestionStore::new(db_pool)),
            engine: Arc::new(SuggestionEngine::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

pub type ApiError = (StatusCode, Json<ApiErrorBody>);

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}/active-plan", put(users::set_active_plan))
        .route("/api/body-areas", get(catalog::list_body_areas))
        .route("/api/exercises", get(catalog::list_exercises))
        .route("/api/users/{id}/plans", get(plans::list_plans).post(plans::create_plan))
        .route("/api/plans/{id}", put(plans::update_plan).delete(plans::delete_plan))
        .route("/api/users/{id}/workouts/start", post(workouts::start_workout))
        .route("/api/users/{id}/workouts/active", get(workouts::active_workout))
        .route("/api/users/{id}/history", get(workouts::history))
        .route("/api/workouts/{id}/finish", post(workouts::finish_workout))
        .route("/api/workouts/{id}/abort", post(workouts::abort_workout))
        .route("/api/workouts/{id}", put(workouts::update_workout).delete(workouts::delete_workout))
        .route("/api/workouts/{id}/sets", post(sets::add_set))
        .route("/api/sets/{id}", put(sets::update_set).delete(sets::delete_set))
        .route("/api/users/{id}/suggestions", get(suggestions::get_suggestions))
        .route("/api/{*path}", any(unknown_api_route))
        .with_state(state)
}

async fn unknown_api_route() -> ApiError {
    not_found("Not found")
}

/// API routes plus request tracing, CORS and optional client hosting.
pub fn app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = router(state);

    if let Some(static_dir) = static_dir {
        let index = static_dir.join("index.html");
        if !index.exists() {
            warn!(
                event_name = "system.static.missing_index",
                correlation_id = "bootstrap",
                static_dir = %static_dir.display(),
                "static directory has no index.html; client routes will 404"
            );
        }
        let spa = ServeDir::new(static_dir).fallback(ServeFile::new(index));
        app = app.fallback_service(spa);
    }

    app.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorBody { error: message.into() }))
}

pub(crate) fn not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

pub(crate) fn validation_error(error: DomainError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, error.to_string())
}

/// Maps store failures onto responses. Database errors are logged and hidden
/// behind `fallback`.
pub(crate) fn repository_error(
    operation: &'static str,
    fallback: &'static str,
) -> impl FnOnce(RepositoryError) -> ApiError {
    move |error| match error {
        RepositoryError::Conflict(message) => api_error(StatusCode::CONFLICT, message),
        RepositoryError::UnknownReference(message) => api_error(StatusCode::BAD_REQUEST, message),
        RepositoryError::Database(_) | RepositoryError::Decode(_) => {
            error!(
                event_name = "api.repository.error",
                operation,
                error = %error,
                "request failed in the store"
            );
            api_error(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}
