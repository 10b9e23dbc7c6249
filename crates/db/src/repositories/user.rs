use sqlx::{sqlite::SqliteRow, Row};

use trainwise_core::domain::plan::PlanId;
use trainwise_core::domain::user::{User, UserId};

use super::{begin_write, ActivePlanChange, RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, active_plan_id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(user_from_row).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, active_plan_id FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(user_from_row).transpose()
    }

    async fn create(&self, name: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO users (name) VALUES (?) RETURNING id, name, active_plan_id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(row)
    }

    async fn set_active_plan(
        &self,
        id: UserId,
        plan_id: Option<PlanId>,
    ) -> Result<ActivePlanChange, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        if let Some(plan_id) = plan_id {
            let owned: Option<i64> =
                sqlx::query_scalar("SELECT id FROM workout_plans WHERE id = ? AND user_id = ?")
                    .bind(plan_id.0)
                    .bind(id.0)
                    .fetch_optional(&mut *tx)
                    .await?;
            if owned.is_none() {
                return Ok(ActivePlanChange::PlanNotFound);
            }
        }

        let row = sqlx::query(
            "UPDATE users SET active_plan_id = ? WHERE id = ?
             RETURNING id, name, active_plan_id",
        )
        .bind(plan_id.map(|plan| plan.0))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(ActivePlanChange::UserNotFound);
        };
        let user = user_from_row(row)?;
        tx.commit().await?;

        Ok(ActivePlanChange::Updated(user))
    }
}

pub(crate) fn user_from_row(row: SqliteRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        name: row.try_get("name")?,
        active_plan_id: row.try_get::<Option<i64>, _>("active_plan_id")?.map(PlanId),
    })
}
