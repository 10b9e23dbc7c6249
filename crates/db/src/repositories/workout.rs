use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{sqlite::SqliteRow, Row, Sqlite};

use trainwise_core::domain::exercise::ExerciseId;
use trainwise_core::domain::user::UserId;
use trainwise_core::domain::workout::{
    ActiveWorkout, SetId, SetWithDetails, Workout, WorkoutId, WorkoutSet, WorkoutWithSets,
};

use super::{
    begin_write, format_date, format_timestamp, is_unique_violation, parse_date,
    parse_optional_timestamp, parse_timestamp, parse_u32, RepositoryError, SetInsert,
    WorkoutRepository, HISTORY_LIMIT,
};
use crate::DbPool;

const WORKOUT_COLUMNS: &str = "id, user_id, workout_date, started_at, completed_at, finished";

const SET_DETAIL_COLUMNS: &str = "s.id, s.workout_id, s.exercise_id, s.pts,
    e.name AS exercise_name, ba.name AS body_area_name";

const ACTIVE_WORKOUT_CONFLICT: &str = "An active workout already exists";

pub struct SqlWorkoutRepository {
    pool: DbPool,
}

impl SqlWorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WorkoutRepository for SqlWorkoutRepository {
    async fn start(
        &self,
        user_id: UserId,
        workout_date: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> Result<Option<Workout>, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Ok(None);
        }

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workouts WHERE user_id = ? AND finished = 0")
                .bind(user_id.0)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(RepositoryError::Conflict(ACTIVE_WORKOUT_CONFLICT.to_string()));
        }

        // The partial unique index backs the check above when two starts race.
        let row = sqlx::query(&format!(
            "INSERT INTO workouts (user_id, workout_date, started_at, finished)
             VALUES (?, ?, ?, 0)
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(user_id.0)
        .bind(format_date(workout_date))
        .bind(format_timestamp(started_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                RepositoryError::Conflict(ACTIVE_WORKOUT_CONFLICT.to_string())
            } else {
                RepositoryError::Database(error)
            }
        })?;
        let workout = workout_from_row(row)?;
        tx.commit().await?;

        Ok(Some(workout))
    }

    async fn finish(
        &self,
        id: WorkoutId,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<Workout>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE workouts SET finished = 1, completed_at = ?
             WHERE id = ? AND finished = 0
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(format_timestamp(completed_at))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(workout_from_row).transpose()
    }

    async fn abort(&self, id: WorkoutId) -> Result<bool, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        let active: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workouts WHERE id = ? AND finished = 0")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await?;
        if active.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM sets WHERE workout_id = ?").bind(id.0).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM workouts WHERE id = ? AND finished = 0")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ActiveWorkout>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts
             WHERE user_id = ? AND finished = 0
             ORDER BY started_at DESC
             LIMIT 1"
        ))
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let workout = workout_from_row(row)?;
        let sets = load_sets_for_workout(&self.pool, workout.id).await?;
        Ok(Some(ActiveWorkout { workout, sets }))
    }

    async fn update_date(
        &self,
        id: WorkoutId,
        workout_date: NaiveDate,
    ) -> Result<Option<Workout>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE workouts SET workout_date = ?
             WHERE id = ? AND finished = 1
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(format_date(workout_date))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(workout_from_row).transpose()
    }

    async fn delete_finished(&self, id: WorkoutId) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM workouts WHERE id = ? AND finished = 1")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn history(&self, user_id: UserId) -> Result<Vec<WorkoutWithSets>, RepositoryError> {
        let workout_rows = sqlx::query(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts
             WHERE user_id = ? AND finished = 1
             ORDER BY workout_date DESC, id DESC
             LIMIT ?"
        ))
        .bind(user_id.0)
        .bind(HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        let workouts =
            workout_rows.into_iter().map(workout_from_row).collect::<Result<Vec<_>, _>>()?;

        let set_rows = sqlx::query(&format!(
            "SELECT {SET_DETAIL_COLUMNS}
             FROM sets s
             JOIN exercises e ON e.id = s.exercise_id
             JOIN body_areas ba ON ba.id = e.body_area_id
             WHERE s.workout_id IN (
                 SELECT id FROM workouts
                 WHERE user_id = ? AND finished = 1
                 ORDER BY workout_date DESC, id DESC
                 LIMIT ?
             )
             ORDER BY s.id"
        ))
        .bind(user_id.0)
        .bind(HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let mut sets_by_workout: HashMap<WorkoutId, Vec<SetWithDetails>> = HashMap::new();
        for row in set_rows {
            let set = set_with_details_from_row(row)?;
            sets_by_workout.entry(set.set.workout_id).or_default().push(set);
        }

        Ok(workouts
            .into_iter()
            .map(|workout| {
                let sets = sets_by_workout.remove(&workout.id).unwrap_or_default();
                WorkoutWithSets { workout, sets }
            })
            .collect())
    }

    async fn add_set(
        &self,
        workout_id: WorkoutId,
        exercise_id: ExerciseId,
        pts: u32,
    ) -> Result<SetInsert, RepositoryError> {
        let mut tx = begin_write(&self.pool).await?;

        let active: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workouts WHERE id = ? AND finished = 0")
                .bind(workout_id.0)
                .fetch_optional(&mut *tx)
                .await?;
        if active.is_none() {
            return Ok(SetInsert::WorkoutNotActive);
        }

        let exercise: Option<i64> = sqlx::query_scalar("SELECT id FROM exercises WHERE id = ?")
            .bind(exercise_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if exercise.is_none() {
            return Ok(SetInsert::UnknownExercise);
        }

        let row = sqlx::query(
            "INSERT INTO sets (workout_id, exercise_id, pts) VALUES (?, ?, ?)
             RETURNING id, workout_id, exercise_id, pts",
        )
        .bind(workout_id.0)
        .bind(exercise_id.0)
        .bind(i64::from(pts))
        .fetch_one(&mut *tx)
        .await?;
        let set = set_from_row(&row)?;
        tx.commit().await?;

        Ok(SetInsert::Added(set))
    }

    async fn update_set_pts(
        &self,
        id: SetId,
        pts: u32,
    ) -> Result<Option<WorkoutSet>, RepositoryError> {
        let row = sqlx::query(
            "UPDATE sets SET pts = ? WHERE id = ? RETURNING id, workout_id, exercise_id, pts",
        )
        .bind(i64::from(pts))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(set_from_row).transpose()
    }

    async fn delete_set(&self, id: SetId) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM sets WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

async fn load_sets_for_workout<'e, E>(
    executor: E,
    workout_id: WorkoutId,
) -> Result<Vec<SetWithDetails>, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {SET_DETAIL_COLUMNS}
         FROM sets s
         JOIN exercises e ON e.id = s.exercise_id
         JOIN body_areas ba ON ba.id = e.body_area_id
         WHERE s.workout_id = ?
         ORDER BY s.id"
    ))
    .bind(workout_id.0)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(set_with_details_from_row).collect()
}

fn workout_from_row(row: SqliteRow) -> Result<Workout, RepositoryError> {
    Ok(Workout {
        id: WorkoutId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        workout_date: parse_date("workout_date", row.try_get("workout_date")?)?,
        started_at: parse_timestamp("started_at", row.try_get("started_at")?)?,
        completed_at: parse_optional_timestamp("completed_at", row.try_get("completed_at")?)?,
        finished: row.try_get::<i64, _>("finished")? != 0,
    })
}

fn set_from_row(row: &SqliteRow) -> Result<WorkoutSet, RepositoryError> {
    Ok(WorkoutSet {
        id: SetId(row.try_get("id")?),
        workout_id: WorkoutId(row.try_get("workout_id")?),
        exercise_id: ExerciseId(row.try_get("exercise_id")?),
        pts: parse_u32("pts", row.try_get("pts")?)?,
    })
}

fn set_with_details_from_row(row: SqliteRow) -> Result<SetWithDetails, RepositoryError> {
    Ok(SetWithDetails {
        set: set_from_row(&row)?,
        exercise_name: row.try_get("exercise_name")?,
        body_area_name: row.try_get("body_area_name")?,
    })
}
