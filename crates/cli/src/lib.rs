pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "trainwise",
    about = "Trainwise operator CLI",
    long_about = "Operate the Trainwise database: migrations, demo data, config inspection, readiness checks and suggestion previews.",
    after_help = "Examples:\n  trainwise doctor --json\n  trainwise seed\n  trainwise suggest --user 1 --date 2025-06-15"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog, user, plans and workout history")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print ranked focus-area suggestions for a user's active plan")]
    Suggest {
        #[arg(long = "user", help = "User id to evaluate")]
        user_id: i64,
        #[arg(long, help = "Evaluate as of this YYYY-MM-DD date instead of today")]
        date: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Suggest { user_id, date } => commands::suggest::run(user_id, date.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
