use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::{begin_write, RepositoryError};

/// Plans shipped with the demo dataset and the focus areas each must carry.
const SEED_PLANS: &[SeedPlanContract] = &[
    SeedPlanContract {
        plan_id: 1,
        name: "General Fitness",
        expected_focus_area_count: 10,
        description: "Balanced full-body plan, active for the demo user",
    },
    SeedPlanContract {
        plan_id: 2,
        name: "Upper Focus",
        expected_focus_area_count: 6,
        description: "Upper body emphasis on a five day period",
    },
];

const SEED_WORKOUTS: &[SeedWorkoutContract] = &[
    SeedWorkoutContract { workout_id: 1, days_ago: 2, expected_set_count: 3 },
    SeedWorkoutContract { workout_id: 2, days_ago: 5, expected_set_count: 3 },
    SeedWorkoutContract { workout_id: 3, days_ago: 8, expected_set_count: 4 },
];

const SEED_USER_ID: i64 = 1;
const SEED_BODY_AREA_COUNT: i64 = 10;
const SEED_EXERCISE_COUNT: i64 = 32;

/// Demo dataset: the body area and exercise catalog, one user with two plans,
/// and a short finished-workout history relative to the local calendar day.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Load the demo dataset. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = begin_write(pool).await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let plans_seeded = SEED_PLANS
            .iter()
            .map(|plan| PlanSeedInfo {
                plan_id: plan.plan_id,
                name: plan.name,
                description: plan.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { user_id: SEED_USER_ID, plans_seeded })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let body_areas: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM body_areas WHERE id <= ?1")
            .bind(SEED_BODY_AREA_COUNT)
            .fetch_one(pool)
            .await?;
        checks.push(("body-area-catalog", body_areas == SEED_BODY_AREA_COUNT));

        let exercises: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM exercises WHERE id <= ?1")
            .bind(SEED_EXERCISE_COUNT)
            .fetch_one(pool)
            .await?;
        checks.push(("exercise-catalog", exercises == SEED_EXERCISE_COUNT));

        let user_exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
                .bind(SEED_USER_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("demo-user", user_exists == 1));

        let active_plan_owned: i64 = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM users u
                JOIN workout_plans p ON p.id = u.active_plan_id AND p.user_id = u.id
                WHERE u.id = ?1
            )",
        )
        .bind(SEED_USER_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("demo-user-active-plan", active_plan_owned == 1));

        for plan in SEED_PLANS {
            let plan_exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM workout_plans WHERE id = ?1 AND name = ?2 AND user_id = ?3)",
            )
            .bind(plan.plan_id)
            .bind(plan.name)
            .bind(SEED_USER_ID)
            .fetch_one(pool)
            .await?;
            checks.push((plan.plan_label(), plan_exists == 1));

            let focus_areas: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM focus_areas WHERE plan_id = ?1")
                    .bind(plan.plan_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((plan.focus_area_label(), focus_areas == plan.expected_focus_area_count));
        }

        for workout in SEED_WORKOUTS {
            let dated: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM workouts
                    WHERE id = ?1 AND finished = 1 AND completed_at IS NOT NULL
                      AND workout_date = date('now', 'localtime', ?2)
                )",
            )
            .bind(workout.workout_id)
            .bind(format!("-{} days", workout.days_ago))
            .fetch_one(pool)
            .await?;
            checks.push((workout.workout_label(), dated == 1));

            let sets: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM sets WHERE workout_id = ?1")
                .bind(workout.workout_id)
                .fetch_one(pool)
                .await?;
            checks.push((workout.set_count_label(), sets == workout.expected_set_count));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the demo user and everything hanging off it. The catalog stays.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = begin_write(pool).await?;

        sqlx::query("UPDATE users SET active_plan_id = NULL WHERE id = ?1")
            .bind(SEED_USER_ID)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?1").bind(SEED_USER_ID).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedPlanContract {
    plan_id: i64,
    name: &'static str,
    expected_focus_area_count: i64,
    description: &'static str,
}

impl SeedPlanContract {
    fn plan_label(&self) -> &'static str {
        match self.plan_id {
            1 => "plan-general-fitness",
            _ => "plan-upper-focus",
        }
    }

    fn focus_area_label(&self) -> &'static str {
        match self.plan_id {
            1 => "plan-general-fitness-focus-areas",
            _ => "plan-upper-focus-focus-areas",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedWorkoutContract {
    workout_id: i64,
    days_ago: i64,
    expected_set_count: i64,
}

impl SeedWorkoutContract {
    fn workout_label(&self) -> &'static str {
        match self.days_ago {
            2 => "workout-2-days-ago",
            5 => "workout-5-days-ago",
            _ => "workout-8-days-ago",
        }
    }

    fn set_count_label(&self) -> &'static str {
        match self.days_ago {
            2 => "workout-2-days-ago-sets",
            5 => "workout-5-days-ago-sets",
            _ => "workout-8-days-ago-sets",
        }
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub user_id: i64,
    pub plans_seeded: Vec<PlanSeedInfo>,
}

#[derive(Debug)]
pub struct PlanSeedInfo {
    pub plan_id: i64,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoSeedDataset::SQL.is_empty());
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoSeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.plans_seeded.len(), 2);

        let second = DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.plans_seeded.len(), 2);
        assert_eq!(first_verification.checks, second_verification.checks);

        let users: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM users").fetch_one(&pool).await.expect("count");
        assert_eq!(users, 1);
    }

    #[tokio::test]
    async fn moved_workout_fails_its_dated_check_until_reload() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");

        sqlx::query(
            "UPDATE workouts SET workout_date = date('now', 'localtime', '-20 days') WHERE id = 2",
        )
        .execute(&pool)
        .await
        .expect("move workout");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.contains(&("workout-5-days-ago", false)));
        assert!(verification.checks.contains(&("workout-5-days-ago-sets", true)));
        assert!(verification.checks.contains(&("workout-2-days-ago", true)));

        DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let verification = DemoSeedDataset::verify(&pool).await.expect("re-verify");
        assert!(verification.all_present, "{:?}", verification.checks);
    }

    #[tokio::test]
    async fn reload_keeps_user_chosen_active_plan() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");

        sqlx::query("UPDATE users SET active_plan_id = 2 WHERE id = 1")
            .execute(&pool)
            .await
            .expect("switch plan");
        DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");

        let active: Option<i64> = sqlx::query_scalar("SELECT active_plan_id FROM users WHERE id = 1")
            .fetch_one(&pool)
            .await
            .expect("active plan");
        assert_eq!(active, Some(2));
    }

    #[tokio::test]
    async fn clean_removes_demo_user_but_keeps_catalog() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");

        DemoSeedDataset::clean(&pool).await.expect("clean seed");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.contains(&("exercise-catalog", true)));
        assert!(verification.checks.contains(&("demo-user", false)));

        let sets: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM sets").fetch_one(&pool).await.expect("count");
        assert_eq!(sets, 0);
    }

    #[test]
    fn seed_contract_json_matches_rust_seed_constants() {
        let contract: serde_json::Value =
            serde_json::from_str(include_str!("../../../config/fixtures/demo_seed_contract.json"))
                .expect("demo seed contract JSON must parse");

        assert_eq!(contract["body_area_count"].as_i64(), Some(SEED_BODY_AREA_COUNT));
        assert_eq!(contract["exercise_count"].as_i64(), Some(SEED_EXERCISE_COUNT));
        assert_eq!(contract["user"]["user_id"].as_i64(), Some(SEED_USER_ID));

        let plans = contract["plans"].as_array().expect("plans should be an array");
        assert_eq!(plans.len(), SEED_PLANS.len());
        for plan in SEED_PLANS {
            let contract_plan = plans
                .iter()
                .find(|candidate| candidate["plan_id"].as_i64() == Some(plan.plan_id))
                .expect("contract should include every seeded plan");
            assert_eq!(contract_plan["name"].as_str(), Some(plan.name));
            assert_eq!(
                contract_plan["focus_area_count"].as_i64(),
                Some(plan.expected_focus_area_count)
            );
        }

        let workouts = contract["workouts"].as_array().expect("workouts should be an array");
        assert_eq!(workouts.len(), SEED_WORKOUTS.len());
        for workout in SEED_WORKOUTS {
            let contract_workout = workouts
                .iter()
                .find(|candidate| candidate["workout_id"].as_i64() == Some(workout.workout_id))
                .expect("contract should include every seeded workout");
            assert_eq!(contract_workout["days_ago"].as_i64(), Some(workout.days_ago));
            assert_eq!(contract_workout["set_count"].as_i64(), Some(workout.expected_set_count));
        }
    }
}
