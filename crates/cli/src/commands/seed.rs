use trainwise_db::{connect_with_config, migrations, DemoSeedDataset, PlanSeedInfo};

use crate::commands::{
    prepare, CommandResult, StepFailure, EXIT_DB_CONNECT, EXIT_MIGRATION, EXIT_VERIFICATION,
};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECT))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        let run_result: Result<SeedOutput, StepFailure> = if verification.all_present {
            Ok(SeedOutput { user_id: seed_result.user_id, plans: seed_result.plans_seeded })
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_message(&failed_checks), EXIT_VERIFICATION))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => CommandResult::success("seed", output.summary()),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    user_id: i64,
    plans: Vec<PlanSeedInfo>,
}

impl SeedOutput {
    fn summary(&self) -> String {
        let plan_lines: Vec<String> = self
            .plans
            .iter()
            .map(|plan| format!("  - plan {}: {} ({})", plan.plan_id, plan.name, plan.description))
            .collect();
        format!(
            "demo dataset loaded for user {} with {} plans:\n{}",
            self.user_id,
            self.plans.len(),
            plan_lines.join("\n")
        )
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let message = verification_message(&["demo-user-active-plan", "workout-5-days-ago"]);
        assert_eq!(
            message,
            "Seed verification failed for checks: demo-user-active-plan, workout-5-days-ago"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }
}
