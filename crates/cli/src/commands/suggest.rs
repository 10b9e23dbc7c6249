use chrono::{Local, NaiveDate};
use trainwise_core::domain::user::UserId;
use trainwise_core::domain::workout::parse_workout_date;
use trainwise_core::suggestions::{FocusAreaSuggestion, SuggestionEngine};
use trainwise_db::repositories::{
    SnapshotDate, SqlSuggestionStore, SqlUserRepository, SuggestionStore, UserRepository,
};
use trainwise_db::{connect_with_config, migrations};

use crate::commands::{
    prepare, CommandResult, StepFailure, EXIT_CONFIG, EXIT_DB_CONNECT, EXIT_MIGRATION,
    EXIT_NOT_FOUND, EXIT_RUNTIME,
};

pub fn run(user_id: i64, date: Option<&str>) -> CommandResult {
    let date = match date.map(parse_workout_date).transpose() {
        Ok(Some(day)) => SnapshotDate::AsOf(day),
        Ok(None) => SnapshotDate::Today(Local::now().date_naive()),
        Err(error) => {
            return CommandResult::failure(
                "suggest",
                "invalid_argument",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let as_of = date.day();

    let (config, runtime) = match prepare("suggest") {
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

        let users = SqlUserRepository::new(pool.clone());
        let store = SqlSuggestionStore::new(pool.clone());
        let outcome = async {
            let user = users
                .find_by_id(UserId(user_id))
                .await
                .map_err(|error| ("store", error.to_string(), EXIT_RUNTIME))?
                .ok_or_else(|| ("not_found", format!("user {user_id} not found"), EXIT_NOT_FOUND))?;

            let Some(plan_id) = user.active_plan_id else {
                return Ok(Vec::new());
            };
            let input = store
                .snapshot(user.id, plan_id, date)
                .await
                .map_err(|error| ("store", error.to_string(), EXIT_RUNTIME))?;
            Ok::<_, StepFailure>(SuggestionEngine::new().compute_suggestions(&input, as_of))
        }
        .await;

        pool.close().await;
        outcome
    });

    match result {
        Ok(suggestions) => {
            let data = serde_json::to_value(&suggestions).ok();
            CommandResult::success_with_data("suggest", summary(user_id, as_of, &suggestions), data)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("suggest", error_class, message, exit_code)
        }
    }
}

fn summary(user_id: i64, as_of: NaiveDate, suggestions: &[FocusAreaSuggestion]) -> String {
    if suggestions.is_empty() {
        return format!("user {user_id} has no active plan as of {as_of}");
    }

    let lines: Vec<String> = suggestions
        .iter()
        .map(|suggestion| {
            let last = match suggestion.days_since_last {
                Some(days) => format!("{days}d ago"),
                None => "never".to_string(),
            };
            format!(
                "  - {}: priority {:.2} ({}/{} pts, last {})",
                suggestion.focus_area.body_area.name,
                suggestion.priority,
                suggestion.pts_fulfilled,
                suggestion.focus_area.pts_per_period,
                last
            )
        })
        .collect();
    format!("suggestions for user {user_id} as of {as_of}:\n{}", lines.join("\n"))
}
