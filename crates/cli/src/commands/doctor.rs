use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use slotwatch_browser::probe_status;
use slotwatch_core::config::{AppConfig, LoadOptions};
use slotwatch_db::{connect_with_settings, migrations, SqlSlotRepository};
use slotwatch_telegram::{BotApi, HttpBotClient};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: reason.to_string() }
    }

    fn from_result(name: &'static str, result: Result<String, String>) -> Self {
        match result {
            Ok(details) => Self { name, status: CheckStatus::Pass, details },
            Err(details) => Self { name, status: CheckStatus::Fail, details },
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(remote_checks(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_connectivity", "webdriver_status", "telegram_bot"] {
                checks.push(DoctorCheck::skipped(
                    name,
                    "skipped because configuration did not load",
                ));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn remote_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let names = ["database_connectivity", "webdriver_status", "telegram_bot"];

    let runtime = match crate::commands::runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return names
                .into_iter()
                .map(|name| DoctorCheck { name, status: CheckStatus::Fail, details: details.clone() })
                .collect();
        }
    };
    let http = match Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(http) => http,
        Err(error) => {
            return vec![
                DoctorCheck::from_result(
                    "database_connectivity",
                    runtime.block_on(check_database(config)),
                ),
                DoctorCheck::skipped(
                    "webdriver_status",
                    &format!("http client could not be built: {error}"),
                ),
                DoctorCheck::skipped(
                    "telegram_bot",
                    &format!("http client could not be built: {error}"),
                ),
            ];
        }
    };

    runtime.block_on(async {
        vec![
            DoctorCheck::from_result("database_connectivity", check_database(config).await),
            DoctorCheck::from_result(
                "webdriver_status",
                bounded(check_webdriver(&http, &config.browser.webdriver_url)).await,
            ),
            DoctorCheck::from_result("telegram_bot", bounded(check_telegram(http, config)).await),
        ]
    })
}

async fn bounded<F>(probe: F) -> Result<String, String>
where
    F: Future<Output = Result<String, String>>,
{
    tokio::time::timeout(PROBE_TIMEOUT, probe)
        .await
        .unwrap_or_else(|_| Err(format!("no answer within {}s", PROBE_TIMEOUT.as_secs())))
}

async fn check_database(config: &AppConfig) -> Result<String, String> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| format!("failed to connect to database: {error}"))?;

    let result = match migrations::run_pending(&pool).await {
        Ok(()) => SqlSlotRepository::new(pool.clone())
            .count()
            .await
            .map_err(|error| format!("schedule table unreadable: {error}")),
        Err(error) => Err(format!("migrations failed: {error}")),
    };
    pool.close().await;

    result.map(|slots| format!("connected using `{}`, {slots} slots stored", config.database.url))
}

async fn check_webdriver(http: &Client, webdriver_url: &str) -> Result<String, String> {
    let status = probe_status(http, webdriver_url)
        .await
        .map_err(|error| format!("webdriver at `{webdriver_url}` unreachable: {error}"))?;

    if status.ready {
        Ok(format!("webdriver at `{webdriver_url}` ready"))
    } else {
        Err(format!("webdriver at `{webdriver_url}` not ready: {}", status.message))
    }
}

async fn check_telegram(http: Client, config: &AppConfig) -> Result<String, String> {
    let api = HttpBotClient::new(
        http,
        config.telegram.api_base_url.clone(),
        config.telegram.bot_token.clone(),
    );
    let me = api.get_me().await.map_err(|error| format!("getMe failed: {error}"))?;

    Ok(match me.username {
        Some(username) => format!("authenticated as @{username}"),
        None => format!("authenticated as bot {}", me.id),
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
