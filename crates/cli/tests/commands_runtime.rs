use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use slotwatch_cli::commands::{check, config, doctor, migrate};

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn valid_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("SLOTWATCH_TELEGRAM_BOT_TOKEN", "123456:test-token"),
        ("SLOTWATCH_TELEGRAM_OPERATOR_CHAT_ID", "42"),
        ("SLOTWATCH_SITE_PHONE", "+70000000000"),
        ("SLOTWATCH_SITE_PASSWORD", "hunter2"),
        ("SLOTWATCH_DATABASE_URL", "sqlite::memory:"),
        ("SLOTWATCH_DATABASE_MAX_CONNECTIONS", "1"),
    ]
}

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&valid_env(), || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_bot_token() {
    with_env(&[("SLOTWATCH_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_reports_unreachable_database() {
    let mut vars = valid_env();
    vars.retain(|(key, _)| *key != "SLOTWATCH_DATABASE_URL");
    vars.push(("SLOTWATCH_DATABASE_URL", "sqlite:///nonexistent-dir/slotwatch/state.db"));
    vars.push(("SLOTWATCH_DATABASE_TIMEOUT_SECS", "1"));

    with_env(&vars, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 4, "expected db connectivity failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "db_connectivity");
    });
}

#[test]
fn config_redacts_secrets_and_attributes_sources() {
    with_env(&valid_env(), || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains(
            "- telegram.bot_token = 123456:*** (source: env (SLOTWATCH_TELEGRAM_BOT_TOKEN))"
        ));
        assert!(output
            .contains("- site.password = <redacted> (source: env (SLOTWATCH_SITE_PASSWORD))"));
        assert!(output.contains("- scheduler.interval_hours = 6 (source: default)"));
        assert!(!output.contains("test-token"));
        assert!(!output.contains("hunter2"));
    });
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed:"));
    });
}

#[test]
fn check_returns_config_failure_without_credentials() {
    with_env(&[], || {
        let result = check::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "check");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn check_reports_unreachable_webdriver_as_session_failure() {
    let mut vars = valid_env();
    vars.push(("SLOTWATCH_BROWSER_WEBDRIVER_URL", UNREACHABLE));

    with_env(&vars, || {
        let result = check::run();
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "check");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "session");
    });
}

#[test]
fn doctor_json_skips_remote_checks_when_config_fails() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert!(checks[1..].iter().all(|check| check["status"] == "skipped"));
    });
}

#[test]
fn doctor_json_reports_each_dependency_separately() {
    let mut vars = valid_env();
    vars.push(("SLOTWATCH_BROWSER_WEBDRIVER_URL", UNREACHABLE));
    vars.push(("SLOTWATCH_TELEGRAM_API_BASE_URL", UNREACHABLE));

    with_env(&vars, || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "fail");
        let status_of = |name: &str| {
            payload["checks"]
                .as_array()
                .and_then(|checks| checks.iter().find(|check| check["name"] == name))
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("database_connectivity"), "pass");
        assert_eq!(status_of("webdriver_status"), "fail");
        assert_eq!(status_of("telegram_bot"), "fail");
    });
}

#[test]
fn doctor_human_output_lists_checks() {
    with_env(&[], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] webdriver_status:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SLOTWATCH_DATABASE_URL",
        "SLOTWATCH_DATABASE_MAX_CONNECTIONS",
        "SLOTWATCH_DATABASE_TIMEOUT_SECS",
        "SLOTWATCH_TELEGRAM_BOT_TOKEN",
        "SLOTWATCH_TELEGRAM_OPERATOR_CHAT_ID",
        "SLOTWATCH_TELEGRAM_API_BASE_URL",
        "SLOTWATCH_TELEGRAM_POLL_TIMEOUT_SECS",
        "SLOTWATCH_SITE_CALENDAR_URL",
        "SLOTWATCH_SITE_PHONE",
        "SLOTWATCH_SITE_PASSWORD",
        "SLOTWATCH_BROWSER_WEBDRIVER_URL",
        "SLOTWATCH_BROWSER_HEADLESS",
        "SLOTWATCH_BROWSER_WAIT_TIMEOUT_SECS",
        "SLOTWATCH_BROWSER_POLL_INTERVAL_MS",
        "SLOTWATCH_BROWSER_MAX_ROUNDS",
        "SLOTWATCH_SCHEDULER_INTERVAL_HOURS",
        "SLOTWATCH_SCHEDULER_RUN_ON_STARTUP",
        "SLOTWATCH_SERVER_BIND_ADDRESS",
        "SLOTWATCH_SERVER_HEALTH_CHECK_PORT",
        "SLOTWATCH_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SLOTWATCH_LOGGING_LEVEL",
        "SLOTWATCH_LOGGING_FORMAT",
        "SLOTWATCH_LOG_LEVEL",
        "SLOTWATCH_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
