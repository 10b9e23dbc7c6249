use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use trainwise_core::domain::plan::PlanId;
use trainwise_core::domain::user::{normalize_user_name, User, UserId};
use trainwise_db::repositories::ActivePlanChange;

use super::{not_found, repository_error, validation_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePlanRequest {
    #[serde(default)]
    pub plan_id: Option<i64>,
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .users
        .list()
        .await
        .map_err(repository_error("list_users", "Failed to fetch users"))?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = normalize_user_name(body.name.as_deref()).map_err(validation_error)?;

    let user = state
        .users
        .create(&name)
        .await
        .map_err(repository_error("create_user", "Failed to create user"))?;

    info!(
        event_name = "api.user.created",
        correlation_id = %user.id.0,
        "user created"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn set_active_plan(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<ActivePlanRequest>,
) -> Result<Json<User>, ApiError> {
    let change = state
        .users
        .set_active_plan(UserId(id), body.plan_id.map(PlanId))
        .await
        .map_err(repository_error("set_active_plan", "Failed to set active plan"))?;

    match change {
        ActivePlanChange::Updated(user) => Ok(Json(user)),
        ActivePlanChange::UserNotFound => Err(not_found("User not found")),
        ActivePlanChange::PlanNotFound => Err(not_found("Plan not found")),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };

    use super::{create_user, list_users, set_active_plan, ActivePlanRequest, CreateUserRequest};
    use crate::api::test_support::seeded_state;

    #[tokio::test]
    async fn create_user_trims_name_and_returns_created() {
        let (pool, state) = seeded_state().await;

        let (status, Json(user)) = create_user(
            State(state.clone()),
            Json(CreateUserRequest { name: Some("  Sam ".to_string()) }),
        )
        .await
        .expect("create user");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.name, "Sam");
        assert_eq!(user.active_plan_id, None);

        let Json(users) = list_users(State(state)).await.expect("list users");
        assert_eq!(users.len(), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn create_user_requires_name() {
        let (pool, state) = seeded_state().await;

        let (status, Json(body)) =
            create_user(State(state), Json(CreateUserRequest { name: Some("   ".to_string()) }))
                .await
                .expect_err("blank name");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Name is required");

        pool.close().await;
    }

    #[tokio::test]
    async fn active_plan_can_be_switched_and_cleared() {
        let (pool, state) = seeded_state().await;

        let Json(user) = set_active_plan(
            Path(1),
            State(state.clone()),
            Json(ActivePlanRequest { plan_id: Some(2) }),
        )
        .await
        .expect("switch plan");
        assert_eq!(user.active_plan_id.map(|plan| plan.0), Some(2));

        let Json(user) =
            set_active_plan(Path(1), State(state.clone()), Json(ActivePlanRequest { plan_id: None }))
                .await
                .expect("clear plan");
        assert_eq!(user.active_plan_id, None);

        let (status, Json(body)) = set_active_plan(
            Path(1),
            State(state.clone()),
            Json(ActivePlanRequest { plan_id: Some(99) }),
        )
        .await
        .expect_err("unknown plan");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Plan not found");

        let (status, Json(body)) =
            set_active_plan(Path(42), State(state), Json(ActivePlanRequest { plan_id: None }))
                .await
                .expect_err("unknown user");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "User not found");

        pool.close().await;
    }
}
