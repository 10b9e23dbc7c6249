use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use trainwise_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

/// Readiness check. The service is degraded when the database cannot be
/// queried; an empty exercise catalog is reported but does not fail it.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, catalog) = match catalog_size(&state.db_pool).await {
        Ok((body_areas, exercises)) => (
            HealthCheck { status: "ready", detail: "catalog query succeeded".to_string() },
            HealthCheck {
                status: if exercises > 0 { "ready" } else { "empty" },
                detail: format!("{body_areas} body areas, {exercises} exercises"),
            },
        ),
        Err(error) => (
            HealthCheck { status: "degraded", detail: format!("catalog query failed: {error}") },
            HealthCheck { status: "unknown", detail: "database unavailable".to_string() },
        ),
    };
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("trainwise-server {}", env!("CARGO_PKG_VERSION")),
        },
        database,
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn catalog_size(pool: &DbPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT (SELECT COUNT(*) FROM body_areas), (SELECT COUNT(*) FROM exercises)",
    )
    .fetch_one(pool)
    .await
}
