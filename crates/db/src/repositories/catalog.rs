use sqlx::Row;

use trainwise_core::domain::body_area::{BodyArea, BodyAreaId};
use trainwise_core::domain::exercise::{CatalogExercise, Exercise, ExerciseId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

/// Read-only access to body areas and their exercises.
pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_body_areas(&self) -> Result<Vec<BodyArea>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM body_areas ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BodyArea { id: BodyAreaId(row.try_get("id")?), name: row.try_get("name")? })
            })
            .collect()
    }

    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT e.id, e.body_area_id, e.name, ba.name AS body_area_name
             FROM exercises e
             JOIN body_areas ba ON ba.id = e.body_area_id
             ORDER BY ba.name, e.name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CatalogExercise {
                    exercise: Exercise {
                        id: ExerciseId(row.try_get("id")?),
                        body_area_id: BodyAreaId(row.try_get("body_area_id")?),
                        name: row.try_get("name")?,
                    },
                    body_area_name: row.try_get("body_area_name")?,
                })
            })
            .collect()
    }
}
