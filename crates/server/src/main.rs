mod bootstrap;
mod cycle;
mod health;
mod scheduler;
mod service;

#[cfg(test)]
mod testing;

use std::time::Duration;

use anyhow::Result;
use slotwatch_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use slotwatch_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the config, so load it before bootstrapping.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState::new(app.db_pool.clone(), app.cycle_runner.status()),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        operator_chat_id = app.config.telegram.operator_chat_id,
        interval_hours = app.config.scheduler.interval_hours,
        "slotwatch-server started"
    );

    tokio::select! {
        _ = app.poll_runner.run() => {}
        _ = app.scheduler.run() => {}
        result = wait_for_shutdown() => result?,
    }

    tracing::info!(event_name = "system.server.stopping", "slotwatch-server stopping");

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.cycle_runner.wait_idle()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            grace_secs = grace.as_secs(),
            "cycle still running at shutdown; abandoning it"
        );
    }
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
