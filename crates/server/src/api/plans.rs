use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use trainwise_core::domain::plan::{PlanDraft, PlanId, PlanWithFocusAreas};
use trainwise_core::domain::user::UserId;

use super::{not_found, repository_error, validation_error, ApiError, AppState, OkResponse};

pub async fn list_plans(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanWithFocusAreas>>, ApiError> {
    let plans = state
        .plans
        .list_for_user(UserId(user_id))
        .await
        .map_err(repository_error("list_plans", "Failed to fetch plans"))?;
    Ok(Json(plans))
}

pub async fn create_plan(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<PlanDraft>,
) -> Result<(StatusCode, Json<PlanWithFocusAreas>), ApiError> {
    let new_plan = body.validate(true).map_err(validation_error)?;

    let user = state
        .users
        .find_by_id(UserId(user_id))
        .await
        .map_err(repository_error("create_plan", "Failed to create plan"))?;
    if user.is_none() {
        return Err(not_found("User not found"));
    }

    let plan = state
        .plans
        .create(UserId(user_id), new_plan)
        .await
        .map_err(repository_error("create_plan", "Failed to create plan"))?;

    info!(
        event_name = "api.plan.created",
        correlation_id = %plan.plan.id.0,
        user_id,
        focus_areas = plan.focus_areas.len(),
        "plan created"
    );
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn update_plan(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<PlanDraft>,
) -> Result<Json<PlanWithFocusAreas>, ApiError> {
    let new_plan = body.validate(false).map_err(validation_error)?;

    let plan = state
        .plans
        .replace(PlanId(id), new_plan)
        .await
        .map_err(repository_error("update_plan", "Failed to update plan"))?
        .ok_or_else(|| not_found("Plan not found"))?;
    Ok(Json(plan))
}

pub async fn delete_plan(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let deleted = state
        .plans
        .delete(PlanId(id))
        .await
        .map_err(repository_error("delete_plan", "Failed to delete plan"))?;
    if !deleted {
        return Err(not_found("Plan not found"));
    }

    info!(event_name = "api.plan.deleted", correlation_id = %id, "plan deleted");
    Ok(OkResponse::ok())
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };
    use serde_json::json;
    use trainwise_core::domain::plan::PlanDraft;

    use super::{create_plan, delete_plan, list_plans, update_plan};
    use crate::api::test_support::seeded_state;

    fn draft(value: serde_json::Value) -> PlanDraft {
        serde_json::from_value(value).expect("plan draft")
    }

    #[tokio::test]
    async fn create_plan_validates_and_assigns_colors() {
        let (pool, state) = seeded_state().await;

        let body = draft(json!({
            "name": "Legs",
            "focusAreas": [
                { "bodyAreaId": 1, "ptsPerPeriod": 4, "ptsType": "effort", "periodLengthDays": 7 },
                { "bodyAreaId": 3, "ptsPerPeriod": 60, "ptsType": "active_minutes", "periodLengthDays": 5 }
            ]
        }));
        let (status, Json(plan)) =
            create_plan(Path(1), State(state.clone()), Json(body)).await.expect("create plan");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(plan.plan.name, "Legs");
        let mut colors: Vec<Option<u32>> =
            plan.focus_areas.iter().map(|focus_area| focus_area.color_index).collect();
        colors.sort();
        assert_eq!(colors, vec![Some(0), Some(1)]);

        let value = serde_json::to_value(&plan).expect("serialize plan");
        assert_eq!(value["name"], "Legs");
        assert_eq!(value["focusAreas"].as_array().map(Vec::len), Some(2));

        let Json(plans) = list_plans(Path(1), State(state)).await.expect("list plans");
        assert_eq!(plans.len(), 3);

        pool.close().await;
    }

    #[tokio::test]
    async fn create_plan_rejects_invalid_submissions() {
        let (pool, state) = seeded_state().await;

        let cases = [
            (json!({ "focusAreas": [] }), "Plan name is required"),
            (json!({ "name": "Empty", "focusAreas": [] }), "At least one focus area is required"),
            (
                json!({ "name": "Zero", "focusAreas": [
                    { "bodyAreaId": 1, "ptsPerPeriod": 0, "ptsType": "effort", "periodLengthDays": 7 }
                ]}),
                "ptsPerPeriod must be a positive integer",
            ),
            (
                json!({ "name": "Unknown", "focusAreas": [
                    { "bodyAreaId": 99, "ptsPerPeriod": 3, "ptsType": "effort", "periodLengthDays": 7 }
                ]}),
                "body area 99 does not exist",
            ),
        ];

        for (body, message) in cases {
            let (status, Json(error)) = create_plan(Path(1), State(state.clone()), Json(draft(body)))
                .await
                .expect_err("invalid plan");
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error.error, message);
        }

        let valid = draft(json!({ "name": "Orphan", "focusAreas": [
            { "bodyAreaId": 1, "ptsPerPeriod": 3, "ptsType": "effort", "periodLengthDays": 7 }
        ]}));
        let (status, _) =
            create_plan(Path(42), State(state), Json(valid)).await.expect_err("unknown user");
        assert_eq!(status, StatusCode::NOT_FOUND);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_and_delete_plan() {
        let (pool, state) = seeded_state().await;

        let body = draft(json!({ "name": "Upper Only", "focusAreas": [
            { "bodyAreaId": 8, "ptsPerPeriod": 5, "ptsType": "effort", "periodLengthDays": 5, "colorIndex": 7 }
        ]}));
        let Json(plan) =
            update_plan(Path(2), State(state.clone()), Json(body)).await.expect("update plan");
        assert_eq!(plan.plan.name, "Upper Only");
        assert_eq!(plan.focus_areas.len(), 1);
        assert_eq!(plan.focus_areas[0].color_index, Some(7));

        let (status, _) = update_plan(
            Path(99),
            State(state.clone()),
            Json(draft(json!({ "name": "Missing" }))),
        )
        .await
        .expect_err("unknown plan");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Json(ok) = delete_plan(Path(2), State(state.clone())).await.expect("delete plan");
        assert!(ok.ok);
        let (status, Json(error)) =
            delete_plan(Path(2), State(state)).await.expect_err("already deleted");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Plan not found");

        pool.close().await;
    }
}
