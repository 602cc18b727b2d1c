pub mod commands;

use clap::{Parser, Subcommand};
use slotwatch_core::config::AppConfig;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "slotwatch",
    about = "Slotwatch operator CLI",
    long_about = "Apply migrations, inspect configuration, run a dry availability check and probe runtime dependencies.",
    after_help = "Examples:\n  slotwatch doctor --json\n  slotwatch config\n  slotwatch check"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Scrape the calendar once and print the summary without storing or sending it"
    )]
    Check,
    #[command(about = "Validate config, database, WebDriver and Telegram readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Check => commands::check::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays parseable.
pub(crate) fn init_logging(config: &AppConfig) {
    use slotwatch_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A second init in the same process is a no-op.
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
