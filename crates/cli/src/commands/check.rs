use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use slotwatch_browser::BrowserScheduleSource;
use slotwatch_core::config::{AppConfig, LoadOptions};
use slotwatch_core::render::{render_full_summary, render_new_slots_message};
use slotwatch_core::{ScheduleSource, SnapshotDiff};
use slotwatch_db::{connect_with_settings, migrations, SlotRepository, SqlSlotRepository};

use crate::commands::{runtime, CommandResult};

/// What a dry cycle saw, rendered the way the bot would send it.
#[derive(Debug)]
pub(crate) struct CheckReport {
    pub rendered: String,
    pub dates_checked: usize,
    pub new_slots: usize,
    pub termination: &'static str,
}

pub(crate) type Failure = (&'static str, String, u8);

/// Fetches availability and diffs it against the stored set. Nothing is
/// written and nothing is sent.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "check",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    crate::init_logging(&config);

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "check",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(check_remote(&config)) {
        Ok(report) => CommandResult::success(
            "check",
            format!(
                "{} dates checked, {} new slots ({})",
                report.dates_checked, report.new_slots, report.termination
            ),
        )
        .with_preamble(&report.rendered),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("check", error_class, message, exit_code)
        }
    }
}

async fn check_remote(config: &AppConfig) -> Result<CheckReport, Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;

    let http = Client::builder()
        .build()
        .map_err(|error| ("runtime_init", error.to_string(), 3u8))?;
    let source = BrowserScheduleSource::from_config(config, http);
    let repository = SqlSlotRepository::new(pool.clone());

    let result = check_with(&source, &repository, Local::now().naive_local()).await;
    pool.close().await;
    result
}

pub(crate) async fn check_with(
    source: &dyn ScheduleSource,
    repository: &dyn SlotRepository,
    checked_at: NaiveDateTime,
) -> Result<CheckReport, Failure> {
    let previous = repository
        .read()
        .await
        .map_err(|error| ("store", error.to_string(), 4u8))?;
    let fetched = source
        .fetch_availability()
        .await
        .map_err(|error| (error.class(), error.to_string(), 6u8))?;

    let diff = SnapshotDiff::compute(&previous, &fetched.snapshot);
    let mut rendered = String::new();
    if diff.has_new_slots() {
        rendered.push_str(&render_new_slots_message(&diff.added, &checked_at));
        rendered.push_str("\n\n");
    }
    rendered.push_str(&render_full_summary(&fetched.snapshot, &fetched.termination, &checked_at));

    Ok(CheckReport {
        rendered,
        dates_checked: fetched.snapshot.dates_checked(),
        new_slots: diff.added.len(),
        termination: fetched.termination.as_str(),
    })
}
