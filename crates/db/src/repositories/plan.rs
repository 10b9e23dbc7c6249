use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};

use trainwise_core::domain::body_area::BodyAreaId;
use trainwise_core::domain::plan::{
    next_color_index, FocusArea, FocusAreaId, NewFocusArea, NewPlan, PlanId, PlanWithFocusAreas,
    PtsType, WorkoutPlan,
};
use trainwise_core::domain::user::UserId;

use super::{begin_write, parse_optional_u32, parse_u32, PlanRepository, RepositoryError};
use crate::DbPool;

const FOCUS_AREA_COLUMNS: &str = "fa.id, fa.plan_id, fa.body_area_id, ba.name AS body_area_name,
    fa.pts_per_period, fa.pts_type, fa.period_length_days, fa.color_index";

pub struct SqlPlanRepository {
    pool: DbPool,
}

impl SqlPlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PlanRepository for SqlPlanRepository {
    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlanWithFocusAreas>, RepositoryError> {
        let plan_rows =
            sqlx::query("SELECT id, name, user_id FROM workout_plans WHERE user_id = ? ORDER BY id")
                .bind(user_id.0)
                .fetch_all(&self.pool)
                .await?;
        let plans = plan_rows.into_iter().map(plan_from_row).collect::<Result<Vec<_>, _>>()?;

        let focus_rows = sqlx::query(&format!(
            "SELECT {FOCUS_AREA_COLUMNS}
             FROM focus_areas fa
             JOIN body_areas ba ON ba.id = fa.body_area_id
             JOIN workout_plans p ON p.id = fa.plan_id
             WHERE p.user_id = ?
             ORDER BY ba.name"
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut by_plan: HashMap<PlanId, Vec<FocusArea>> = HashMap::new();
        for row in focus_rows {
            let focus_area = focus_area_from_row(row)?;
            by_plan.entry(focus_area.plan_id).or_default().push(focus_area);
        }

        Ok(plans
            .into_iter()
            .map(|plan| {
                let focus_areas = by_plan.remove(&plan.id).unwrap_or_default();
                PlanWithFocusAreas { plan, focus_areas }
            })
            .collect())
    }

    async fn find_by_id(&self, id: PlanId) -> Result<Option<PlanWithFocusAreas>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, user_id FROM workout_plans WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let plan = plan_from_row(row)?;
        let focus_areas = load_focus_areas(&self.pool, id).await?;
        Ok(Some(PlanWithFocusAreas { plan, focus_areas }))
    }

    async fn create(
        &self,
        user_id: UserId,
        plan: NewPlan,
    ) -> Result<PlanWithFocusAreas, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(RepositoryError::UnknownReference(format!(
                "user {} does not exist",
                user_id.0
            )));
        }

        let row = sqlx::query(
            "INSERT INTO workout_plans (name, user_id) VALUES (?, ?) RETURNING id, name, user_id",
        )
        .bind(&plan.name)
        .bind(user_id.0)
        .fetch_one(&mut *tx)
        .await?;
        let created = plan_from_row(row)?;

        insert_focus_areas(&mut tx, created.id, &plan.focus_areas).await?;
        let focus_areas = load_focus_areas(&mut *tx, created.id).await?;
        tx.commit().await?;

        Ok(PlanWithFocusAreas { plan: created, focus_areas })
    }

    async fn replace(
        &self,
        id: PlanId,
        plan: NewPlan,
    ) -> Result<Option<PlanWithFocusAreas>, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        let row = sqlx::query(
            "UPDATE workout_plans SET name = ? WHERE id = ? RETURNING id, name, user_id",
        )
        .bind(&plan.name)
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let updated = plan_from_row(row)?;

        sqlx::query("DELETE FROM focus_areas WHERE plan_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        insert_focus_areas(&mut tx, id, &plan.focus_areas).await?;
        let focus_areas = load_focus_areas(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(Some(PlanWithFocusAreas { plan: updated, focus_areas }))
    }

    async fn delete(&self, id: PlanId) -> Result<bool, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("UPDATE users SET active_plan_id = NULL WHERE active_plan_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM workout_plans WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// Inserts focus areas in submission order. Missing color indices take the
/// lowest palette slot not already used in the plan.
async fn insert_focus_areas(
    tx: &mut Transaction<'_, Sqlite>,
    plan_id: PlanId,
    focus_areas: &[NewFocusArea],
) -> Result<(), RepositoryError> {
    let mut used_colors: Vec<u32> = focus_areas.iter().filter_map(|area| area.color_index).collect();

    for (position, focus_area) in focus_areas.iter().enumerate() {
        let known: Option<i64> = sqlx::query_scalar("SELECT id FROM body_areas WHERE id = ?")
            .bind(focus_area.body_area_id.0)
            .fetch_optional(&mut **tx)
            .await?;
        if known.is_none() {
            return Err(RepositoryError::UnknownReference(format!(
                "body area {} does not exist",
                focus_area.body_area_id.0
            )));
        }

        let color_index = match focus_area.color_index {
            Some(index) => index,
            None => {
                let assigned = next_color_index(&used_colors, position);
                used_colors.push(assigned);
                assigned
            }
        };

        sqlx::query(
            "INSERT INTO focus_areas
                (plan_id, body_area_id, pts_per_period, pts_type, period_length_days, color_index)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(plan_id.0)
        .bind(focus_area.body_area_id.0)
        .bind(i64::from(focus_area.pts_per_period))
        .bind(focus_area.pts_type.as_str())
        .bind(i64::from(focus_area.period_length_days))
        .bind(i64::from(color_index))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub(crate) async fn load_focus_areas<'e, E>(
    executor: E,
    plan_id: PlanId,
) -> Result<Vec<FocusArea>, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {FOCUS_AREA_COLUMNS}
         FROM focus_areas fa
         JOIN body_areas ba ON ba.id = fa.body_area_id
         WHERE fa.plan_id = ?
         ORDER BY ba.name"
    ))
    .bind(plan_id.0)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(focus_area_from_row).collect()
}

fn plan_from_row(row: SqliteRow) -> Result<WorkoutPlan, RepositoryError> {
    Ok(WorkoutPlan {
        id: PlanId(row.try_get("id")?),
        name: row.try_get("name")?,
        user_id: UserId(row.try_get("user_id")?),
    })
}

pub(crate) fn focus_area_from_row(row: SqliteRow) -> Result<FocusArea, RepositoryError> {
    let pts_type_raw = row.try_get::<String, _>("pts_type")?;
    let pts_type = pts_type_raw
        .parse::<PtsType>()
        .map_err(|_| RepositoryError::Decode(format!("unknown pts_type `{pts_type_raw}`")))?;

    Ok(FocusArea {
        id: FocusAreaId(row.try_get("id")?),
        plan_id: PlanId(row.try_get("plan_id")?),
        body_area_id: BodyAreaId(row.try_get("body_area_id")?),
        body_area_name: row.try_get("body_area_name")?,
        pts_per_period: parse_u32("pts_per_period", row.try_get("pts_per_period")?)?,
        pts_type,
        period_length_days: parse_u32("period_length_days", row.try_get("period_length_days")?)?,
        color_index: parse_optional_u32("color_index", row.try_get("color_index")?)?,
    })
}

#[cfg(test)]
mod tests {
    use trainwise_core::domain::body_area::BodyAreaId;
    use trainwise_core::domain::plan::{NewFocusArea, NewPlan, PlanId, PtsType};
    use trainwise_core::domain::user::UserId;

    use super::SqlPlanRepository;
    use crate::repositories::{
        ActivePlanChange, PlanRepository, RepositoryError, SqlUserRepository, UserRepository,
    };
    use crate::{connect_with_settings, migrations, DbPool, DemoSeedDataset};

    fn area(body_area: i64, pts: u32, days: u32, color: Option<u32>) -> NewFocusArea {
        NewFocusArea {
            body_area_id: BodyAreaId(body_area),
            pts_per_period: pts,
            pts_type: PtsType::Effort,
            period_length_days: days,
            color_index: color,
        }
    }

    #[tokio::test]
    async fn create_assigns_missing_colors_and_lists_by_user() {
        let pool = setup_pool().await;
        let repo = SqlPlanRepository::new(pool.clone());

        let created = repo
            .create(
                UserId(1),
                NewPlan {
                    name: "Legs".to_string(),
                    focus_areas: vec![area(1, 3, 7, Some(0)), area(2, 2, 4, None), area(3, 60, 7, None)],
                },
            )
            .await
            .expect("create plan");

        assert_eq!(created.plan.name, "Legs");
        assert_eq!(created.focus_areas.len(), 3);
        let mut colors: Vec<Option<u32>> =
            created.focus_areas.iter().map(|area| area.color_index).collect();
        colors.sort();
        assert_eq!(colors, vec![Some(0), Some(1), Some(2)]);

        let plans = repo.list_for_user(UserId(1)).await.expect("list plans");
        let names: Vec<&str> = plans.iter().map(|plan| plan.plan.name.as_str()).collect();
        assert_eq!(names, vec!["General Fitness", "Upper Focus", "Legs"]);
        assert_eq!(plans[0].focus_areas.len(), 10);
        assert_eq!(plans[1].focus_areas.len(), 6);

        pool.close().await;
    }

    #[tokio::test]
    async fn create_rejects_unknown_body_area_without_partial_writes() {
        let pool = setup_pool().await;
        let repo = SqlPlanRepository::new(pool.clone());

        let error = repo
            .create(
                UserId(1),
                NewPlan { name: "Broken".to_string(), focus_areas: vec![area(1, 3, 7, None), area(404, 3, 7, None)] },
            )
            .await
            .expect_err("unknown body area");
        assert!(matches!(error, RepositoryError::UnknownReference(_)));

        let plans = repo.list_for_user(UserId(1)).await.expect("list plans");
        assert_eq!(plans.len(), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn replace_swaps_focus_areas_atomically() {
        let pool = setup_pool().await;
        let repo = SqlPlanRepository::new(pool.clone());

        let replaced = repo
            .replace(
                PlanId(2),
                NewPlan { name: "Upper Only".to_string(), focus_areas: vec![area(5, 5, 6, None)] },
            )
            .await
            .expect("replace plan")
            .expect("plan exists");

        assert_eq!(replaced.plan.name, "Upper Only");
        assert_eq!(replaced.focus_areas.len(), 1);
        assert_eq!(replaced.focus_areas[0].body_area_name, "Back");
        assert_eq!(replaced.focus_areas[0].pts_per_period, 5);

        let missing = repo
            .replace(PlanId(99), NewPlan { name: "Nope".to_string(), focus_areas: Vec::new() })
            .await
            .expect("replace missing");
        assert!(missing.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn delete_clears_active_selection() {
        let pool = setup_pool().await;
        let plans = SqlPlanRepository::new(pool.clone());
        let users = SqlUserRepository::new(pool.clone());

        assert!(plans.delete(PlanId(1)).await.expect("delete plan"));
        assert!(!plans.delete(PlanId(1)).await.expect("delete again"));

        let user = users.find_by_id(UserId(1)).await.expect("find user").expect("user exists");
        assert_eq!(user.active_plan_id, None);
        assert!(plans.find_by_id(PlanId(1)).await.expect("find plan").is_none());

        let focus_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM focus_areas WHERE plan_id = 1")
                .fetch_one(&pool)
                .await
                .expect("count focus areas");
        assert_eq!(focus_count, 0);

        let change = users.set_active_plan(UserId(1), Some(PlanId(2))).await.expect("activate");
        assert!(matches!(change, ActivePlanChange::Updated(_)));

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("load seed");
        pool
    }
}
