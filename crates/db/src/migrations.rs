use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_TABLES: &[&str] =
        &["users", "body_areas", "exercises", "workout_plans", "focus_areas", "workouts", "sets"];

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "users",
        "body_areas",
        "exercises",
        "workout_plans",
        "focus_areas",
        "workouts",
        "sets",
        "idx_exercises_body_area_id",
        "idx_workout_plans_user_id",
        "idx_focus_areas_plan_id",
        "idx_workouts_user_finished_date",
        "idx_workouts_one_active_per_user",
        "idx_sets_workout_id",
        "idx_sets_exercise_id",
    ];

    #[tokio::test]
    async fn migrations_create_baseline_tables() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        for table in MANAGED_TABLES {
            let count = sqlx::query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(*table)
            .fetch_one(&pool)
            .await
            .expect("check table")
            .get::<i64, _>("count");
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[tokio::test]
    async fn focus_area_checks_reject_non_positive_targets() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        sqlx::query("INSERT INTO users (id, name) VALUES (1, 'PJ')")
            .execute(&pool)
            .await
            .expect("insert user");
        sqlx::query("INSERT INTO body_areas (id, name) VALUES (1, 'Back')")
            .execute(&pool)
            .await
            .expect("insert body area");
        sqlx::query("INSERT INTO workout_plans (id, name, user_id) VALUES (1, 'Plan', 1)")
            .execute(&pool)
            .await
            .expect("insert plan");

        let zero_target = sqlx::query(
            "INSERT INTO focus_areas (plan_id, body_area_id, pts_per_period, pts_type, period_length_days)
             VALUES (1, 1, 0, 'effort', 7)",
        )
        .execute(&pool)
        .await;
        assert!(zero_target.is_err());

        let unknown_type = sqlx::query(
            "INSERT INTO focus_areas (plan_id, body_area_id, pts_per_period, pts_type, period_length_days)
             VALUES (1, 1, 3, 'reps', 7)",
        )
        .execute(&pool)
        .await;
        assert!(unknown_type.is_err());
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        let workouts_count = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = 'workouts'",
        )
        .fetch_one(&pool)
        .await
        .expect("check workouts table removed")
        .get::<i64, _>("count");

        assert_eq!(workouts_count, 0);
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            initial_signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "initial migration pass should create all managed schema objects",
        );

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        let after_down_signature = managed_schema_signature(&pool).await;
        assert!(
            after_down_signature.is_empty(),
            "managed schema objects should be removed after full undo",
        );

        run_pending(&pool).await.expect("re-run migrations");

        let after_second_up_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            after_second_up_signature, initial_signature,
            "up/down/up should preserve migration-managed schema signature",
        );
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            if MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()) {
                Some((row.get::<String, _>("type"), name, row.get::<String, _>("sql")))
            } else {
                None
            }
        })
        .collect();
        signature.sort();
        signature
    }
}
