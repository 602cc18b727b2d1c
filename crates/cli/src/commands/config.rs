use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use slotwatch_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    for (key, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

type Entry = (&'static str, String, &'static [&'static str]);

fn effective_values(config: &AppConfig) -> Vec<Entry> {
    let entries: [Entry; 22] = [
        ("database.url", config.database.url.clone(), &["SLOTWATCH_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["SLOTWATCH_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["SLOTWATCH_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "telegram.bot_token",
            redact_bot_token(config.telegram.bot_token.expose_secret()),
            &["SLOTWATCH_TELEGRAM_BOT_TOKEN"],
        ),
        (
            "telegram.operator_chat_id",
            config.telegram.operator_chat_id.to_string(),
            &["SLOTWATCH_TELEGRAM_OPERATOR_CHAT_ID"],
        ),
        (
            "telegram.api_base_url",
            config.telegram.api_base_url.clone(),
            &["SLOTWATCH_TELEGRAM_API_BASE_URL"],
        ),
        (
            "telegram.poll_timeout_secs",
            config.telegram.poll_timeout_secs.to_string(),
            &["SLOTWATCH_TELEGRAM_POLL_TIMEOUT_SECS"],
        ),
        ("site.calendar_url", config.site.calendar_url.clone(), &["SLOTWATCH_SITE_CALENDAR_URL"]),
        ("site.phone", config.site.phone.clone(), &["SLOTWATCH_SITE_PHONE"]),
        (
            "site.password",
            redact_secret(config.site.password.expose_secret()),
            &["SLOTWATCH_SITE_PASSWORD"],
        ),
        (
            "browser.webdriver_url",
            config.browser.webdriver_url.clone(),
            &["SLOTWATCH_BROWSER_WEBDRIVER_URL"],
        ),
        ("browser.headless", config.browser.headless.to_string(), &["SLOTWATCH_BROWSER_HEADLESS"]),
        (
            "browser.wait_timeout_secs",
            config.browser.wait_timeout_secs.to_string(),
            &["SLOTWATCH_BROWSER_WAIT_TIMEOUT_SECS"],
        ),
        (
            "browser.poll_interval_ms",
            config.browser.poll_interval_ms.to_string(),
            &["SLOTWATCH_BROWSER_POLL_INTERVAL_MS"],
        ),
        (
            "browser.max_rounds",
            config.browser.max_rounds.to_string(),
            &["SLOTWATCH_BROWSER_MAX_ROUNDS"],
        ),
        (
            "scheduler.interval_hours",
            config.scheduler.interval_hours.to_string(),
            &["SLOTWATCH_SCHEDULER_INTERVAL_HOURS"],
        ),
        (
            "scheduler.run_on_startup",
            config.scheduler.run_on_startup.to_string(),
            &["SLOTWATCH_SCHEDULER_RUN_ON_STARTUP"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["SLOTWATCH_SERVER_BIND_ADDRESS"],
        ),
        (
            "server.health_check_port",
            config.server.health_check_port.to_string(),
            &["SLOTWATCH_SERVER_HEALTH_CHECK_PORT"],
        ),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["SLOTWATCH_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["SLOTWATCH_LOGGING_LEVEL", "SLOTWATCH_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["SLOTWATCH_LOGGING_FORMAT", "SLOTWATCH_LOG_FORMAT"],
        ),
    ];
    entries.into()
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("slotwatch.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/slotwatch.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the numeric bot id, hides the secret half.
fn redact_bot_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: &str) -> String {
    if secret.is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
