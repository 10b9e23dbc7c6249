use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::Row;

use trainwise_core::domain::body_area::BodyAreaId;
use trainwise_core::domain::exercise::{Exercise, ExerciseId};
use trainwise_core::domain::plan::{FocusArea, FocusAreaId, PlanId};
use trainwise_core::domain::user::UserId;
use trainwise_core::suggestions::SuggestionInput;

use super::plan::load_focus_areas;
use super::{format_date, parse_date, RepositoryError, SnapshotDate, SuggestionStore};
use crate::DbPool;

/// Assembles [`SuggestionInput`] snapshots from the workout log.
///
/// Only finished workouts count. Windows are measured on `workout_date`, with
/// an inclusive lower bound of `day - period_length_days`. The upper bound is
/// open for [`SnapshotDate::Today`] and the chosen day for
/// [`SnapshotDate::AsOf`].
pub struct SqlSuggestionStore {
    pool: DbPool,
}

impl SqlSuggestionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Sum of points per focus area inside its own trailing window.
    pub async fn points_in_window(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        date: SnapshotDate,
    ) -> Result<HashMap<FocusAreaId, u64>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT fa.id AS focus_area_id,
                    COALESCE((
                        SELECT SUM(s.pts)
                        FROM sets s
                        JOIN exercises e ON e.id = s.exercise_id
                        JOIN workouts w ON w.id = s.workout_id
                        WHERE w.user_id = ?
                          AND w.finished = 1
                          AND e.body_area_id = fa.body_area_id
                          AND w.workout_date >= date(?, '-' || fa.period_length_days || ' days')
                          AND (? IS NULL OR w.workout_date <= ?)
                    ), 0) AS pts
             FROM focus_areas fa
             WHERE fa.plan_id = ?",
        )
        .bind(user_id.0)
        .bind(format_date(date.day()))
        .bind(through(date))
        .bind(through(date))
        .bind(plan_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let pts: i64 = row.try_get("pts")?;
                let pts = u64::try_from(pts).map_err(|_| {
                    RepositoryError::Decode(format!("negative point total in window: {pts}"))
                })?;
                Ok((FocusAreaId(row.try_get("focus_area_id")?), pts))
            })
            .collect()
    }

    /// Most recent finished workout date per body area of the plan.
    pub async fn body_area_last_done(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        date: SnapshotDate,
    ) -> Result<HashMap<BodyAreaId, NaiveDate>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT e.body_area_id, MAX(w.workout_date) AS last_done
             FROM sets s
             JOIN exercises e ON e.id = s.exercise_id
             JOIN workouts w ON w.id = s.workout_id
             WHERE w.user_id = ?
               AND w.finished = 1
               AND e.body_area_id IN (SELECT body_area_id FROM focus_areas WHERE plan_id = ?)
               AND (? IS NULL OR w.workout_date <= ?)
             GROUP BY e.body_area_id",
        )
        .bind(user_id.0)
        .bind(plan_id.0)
        .bind(through(date))
        .bind(through(date))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok((
                    BodyAreaId(row.try_get("body_area_id")?),
                    parse_date("last_done", row.try_get("last_done")?)?,
                ))
            })
            .collect()
    }

    /// Most recent finished workout date per exercise in the plan's body areas.
    pub async fn exercise_last_done(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        date: SnapshotDate,
    ) -> Result<HashMap<ExerciseId, NaiveDate>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT s.exercise_id, MAX(w.workout_date) AS last_done
             FROM sets s
             JOIN exercises e ON e.id = s.exercise_id
             JOIN workouts w ON w.id = s.workout_id
             WHERE w.user_id = ?
               AND w.finished = 1
               AND e.body_area_id IN (SELECT body_area_id FROM focus_areas WHERE plan_id = ?)
               AND (? IS NULL OR w.workout_date <= ?)
             GROUP BY s.exercise_id",
        )
        .bind(user_id.0)
        .bind(plan_id.0)
        .bind(through(date))
        .bind(through(date))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok((
                    ExerciseId(row.try_get("exercise_id")?),
                    parse_date("last_done", row.try_get("last_done")?)?,
                ))
            })
            .collect()
    }

    /// Catalog exercises for the plan's body areas, grouped by body area.
    pub async fn exercises_for_plan(
        &self,
        plan_id: PlanId,
    ) -> Result<Vec<Exercise>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT e.id, e.body_area_id, e.name
             FROM exercises e
             WHERE e.body_area_id IN (SELECT body_area_id FROM focus_areas WHERE plan_id = ?)
             ORDER BY e.body_area_id, e.name",
        )
        .bind(plan_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Exercise {
                    id: ExerciseId(row.try_get("id")?),
                    body_area_id: BodyAreaId(row.try_get("body_area_id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn focus_areas(&self, plan_id: PlanId) -> Result<Vec<FocusArea>, RepositoryError> {
        load_focus_areas(&self.pool, plan_id).await
    }
}

#[async_trait::async_trait]
impl SuggestionStore for SqlSuggestionStore {
    async fn snapshot(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        date: SnapshotDate,
    ) -> Result<SuggestionInput, RepositoryError> {
        let (focus_areas, points, body_area_last_done, exercise_last_done, exercises) = tokio::try_join!(
            self.focus_areas(plan_id),
            self.points_in_window(user_id, plan_id, date),
            self.body_area_last_done(user_id, plan_id, date),
            self.exercise_last_done(user_id, plan_id, date),
            self.exercises_for_plan(plan_id),
        )?;

        let mut input = SuggestionInput::new(focus_areas);
        input.fulfillment_by_focus_area = points;
        input.last_done_by_body_area = body_area_last_done;
        for exercise in exercises {
            let last_done = exercise_last_done.get(&exercise.id).copied();
            input = input.with_exercise(exercise, last_done);
        }

        Ok(input)
    }
}

fn through(date: SnapshotDate) -> Option<String> {
    date.through().map(format_date)
}
