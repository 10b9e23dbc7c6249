use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trainwise_core::domain::user::UserId;
use trainwise_core::domain::workout::{parse_workout_date, ActiveWorkout};
use trainwise_core::suggestions::FocusAreaSuggestion;
use trainwise_db::repositories::SnapshotDate;

use super::{not_found, repository_error, today, validation_error, ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionsQuery {
    /// Evaluate as of this calendar day instead of the server's local date.
    /// Workouts dated after it are ignored.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse {
    pub suggestions: Vec<FocusAreaSuggestion>,
    pub active_workout: Option<ActiveWorkout>,
}

/// Ranked focus areas for the user's active plan, plus the unfinished
/// workout (if any) so a client can render both from one request.
pub async fn get_suggestions(
    Path(user_id): Path<i64>,
    Query(query): Query<SuggestionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => SnapshotDate::AsOf(parse_workout_date(raw).map_err(validation_error)?),
        None => SnapshotDate::Today(today()),
    };
    let as_of = date.day();

    let user = state
        .users
        .find_by_id(UserId(user_id))
        .await
        .map_err(repository_error("get_suggestions", "Failed to fetch suggestions"))?
        .ok_or_else(|| not_found("User not found"))?;

    let active_workout = state
        .workouts
        .active_for_user(user.id)
        .await
        .map_err(repository_error("get_suggestions", "Failed to fetch suggestions"))?;

    let suggestions = match user.active_plan_id {
        Some(plan_id) => {
            let input = state
                .suggestion_store
                .snapshot(user.id, plan_id, date)
                .await
                .map_err(repository_error("get_suggestions", "Failed to fetch suggestions"))?;
            state.engine.compute_suggestions(&input, as_of)
        }
        None => Vec::new(),
    };

    debug!(
        event_name = "api.suggestions.computed",
        correlation_id = %user_id,
        as_of = %as_of,
        count = suggestions.len(),
        "suggestions computed"
    );
    Ok(Json(SuggestionsResponse { suggestions, active_workout }))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use trainwise_core::domain::plan::PlanId;
    use trainwise_core::domain::user::UserId;

    use super::{get_suggestions, SuggestionsQuery};
    use crate::api::test_support::seeded_state;

    fn as_of(raw: Option<String>) -> Query<SuggestionsQuery> {
        Query(SuggestionsQuery { date: raw })
    }

    #[tokio::test]
    async fn suggestions_rank_active_plan_as_of_requested_date() {
        let (pool, state) = seeded_state().await;
        let today: String = sqlx::query_scalar("SELECT date('now', 'localtime')")
            .fetch_one(&pool)
            .await
            .expect("local date");

        let Json(response) =
            get_suggestions(Path(1), as_of(Some(today)), State(state))
                .await
                .expect("suggestions");
        assert_eq!(response.suggestions.len(), 10);
        assert!(response.active_workout.is_none());
        assert_eq!(response.suggestions[0].priority, 8.0);
        assert!(response
            .suggestions
            .windows(2)
            .all(|pair| pair[0].priority >= pair[1].priority));

        let value = serde_json::to_value(&response).expect("serialize response");
        assert!(value["activeWorkout"].is_null());
        assert!(value["suggestions"][0]["focusArea"]["bodyArea"]["name"].is_string());

        pool.close().await;
    }

    #[tokio::test]
    async fn past_date_ignores_workouts_logged_after_it() {
        let (pool, state) = seeded_state().await;
        let six_days_ago: String = sqlx::query_scalar("SELECT date('now', 'localtime', '-6 days')")
            .fetch_one(&pool)
            .await
            .expect("local date");

        let Json(response) = get_suggestions(Path(1), as_of(Some(six_days_ago)), State(state))
            .await
            .expect("suggestions");
        let back = response
            .suggestions
            .iter()
            .find(|suggestion| suggestion.focus_area.body_area.name == "Back")
            .expect("back");
        assert_eq!(back.pts_fulfilled, 0);
        assert_eq!(back.days_since_last, None);
        let chest = response
            .suggestions
            .iter()
            .find(|suggestion| suggestion.focus_area.body_area.name == "Chest")
            .expect("chest");
        assert_eq!(chest.days_since_last, Some(2));

        pool.close().await;
    }

    #[tokio::test]
    async fn no_active_plan_yields_empty_list() {
        let (pool, state) = seeded_state().await;
        state.users.set_active_plan(UserId(1), None).await.expect("clear plan");

        let Json(response) =
            get_suggestions(Path(1), as_of(None), State(state.clone())).await.expect("suggestions");
        assert!(response.suggestions.is_empty());

        state.users.set_active_plan(UserId(1), Some(PlanId(2))).await.expect("switch plan");
        let Json(response) =
            get_suggestions(Path(1), as_of(None), State(state)).await.expect("suggestions");
        assert_eq!(response.suggestions.len(), 6);

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_user_and_bad_date_are_rejected() {
        let (pool, state) = seeded_state().await;

        let (status, Json(error)) =
            get_suggestions(Path(42), as_of(None), State(state.clone())).await.expect_err("unknown");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "User not found");

        let (status, _) =
            get_suggestions(Path(1), as_of(Some("yesterday".to_string())), State(state))
                .await
                .expect_err("bad date");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        pool.close().await;
    }
}
