use std::sync::Arc;

use reqwest::Client;
use slotwatch_browser::BrowserScheduleSource;
use slotwatch_core::config::{AppConfig, ConfigError, LoadOptions};
use slotwatch_db::{connect_with_settings, migrations, DbPool, SqlSlotRepository};
use slotwatch_telegram::{
    HttpBotClient, LongPollRunner, NotificationSink, ReconnectPolicy, UpdateDispatcher,
};
use thiserror::Error;
use tracing::info;

use crate::cycle::CycleRunner;
use crate::scheduler::IntervalScheduler;
use crate::service::BotCommandService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub cycle_runner: Arc<CycleRunner>,
    pub scheduler: IntervalScheduler,
    pub poll_runner: LongPollRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let http = Client::builder().build().map_err(BootstrapError::HttpClient)?;
    let api = Arc::new(HttpBotClient::new(
        http.clone(),
        config.telegram.api_base_url.clone(),
        config.telegram.bot_token.clone(),
    ));

    let source = Arc::new(BrowserScheduleSource::from_config(&config, http));
    let repository = Arc::new(SqlSlotRepository::new(db_pool.clone()));
    let sink = Arc::new(NotificationSink::new(api.clone(), config.telegram.operator_chat_id));
    let cycle_runner = Arc::new(CycleRunner::new(source, repository, sink));

    let service = Arc::new(BotCommandService::new(cycle_runner.clone(), api.clone()));
    let dispatcher = UpdateDispatcher::new(api.clone(), service, config.telegram.operator_chat_id);
    let poll_timeout_secs = u32::try_from(config.telegram.poll_timeout_secs).unwrap_or(30);
    let poll_runner =
        LongPollRunner::new(api, dispatcher, ReconnectPolicy::default(), poll_timeout_secs);

    let scheduler = IntervalScheduler::from_config(cycle_runner.clone(), &config.scheduler);

    Ok(Application { config, db_pool, cycle_runner, scheduler, poll_runner })
}
