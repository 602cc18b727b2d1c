use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    /// The only chat allowed to drive the bot; every notification goes here.
    pub operator_chat_id: i64,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub calendar_url: String,
    pub phone: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_rounds: u32,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub interval_hours: u64,
    pub run_on_startup: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub operator_chat_id: Option<i64>,
    pub site_phone: Option<String>,
    pub site_password: Option<String>,
    pub webdriver_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://slotwatch.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                operator_chat_id: 0,
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
            },
            site: SiteConfig {
                calendar_url: "https://www.lk.oz-avtoschool.ru/driving-record".to_string(),
                phone: String::new(),
                password: String::new().into(),
            },
            browser: BrowserConfig {
                webdriver_url: "http://localhost:9515".to_string(),
                headless: true,
                wait_timeout_secs: 10,
                poll_interval_ms: 250,
                max_rounds: 10,
            },
            scheduler: SchedulerConfig { interval_hours: 6, run_on_startup: true },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("slotwatch.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(telegram) = patch.telegram {
            if let Some(bot_token) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token);
            }
            if let Some(operator_chat_id) = telegram.operator_chat_id {
                self.telegram.operator_chat_id = operator_chat_id;
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
        }

        if let Some(site) = patch.site {
            if let Some(calendar_url) = site.calendar_url {
                self.site.calendar_url = calendar_url;
            }
            if let Some(phone) = site.phone {
                self.site.phone = phone;
            }
            if let Some(password) = site.password {
                self.site.password = secret_value(password);
            }
        }

        if let Some(browser) = patch.browser {
            if let Some(webdriver_url) = browser.webdriver_url {
                self.browser.webdriver_url = webdriver_url;
            }
            if let Some(headless) = browser.headless {
                self.browser.headless = headless;
            }
            if let Some(wait_timeout_secs) = browser.wait_timeout_secs {
                self.browser.wait_timeout_secs = wait_timeout_secs;
            }
            if let Some(poll_interval_ms) = browser.poll_interval_ms {
                self.browser.poll_interval_ms = poll_interval_ms;
            }
            if let Some(max_rounds) = browser.max_rounds {
                self.browser.max_rounds = max_rounds;
            }
        }

        if let Some(scheduler) = patch.scheduler {
            if let Some(interval_hours) = scheduler.interval_hours {
                self.scheduler.interval_hours = interval_hours;
            }
            if let Some(run_on_startup) = scheduler.run_on_startup {
                self.scheduler.run_on_startup = run_on_startup;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SLOTWATCH_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SLOTWATCH_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("SLOTWATCH_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("SLOTWATCH_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SLOTWATCH_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("SLOTWATCH_TELEGRAM_OPERATOR_CHAT_ID") {
            self.telegram.operator_chat_id =
                parse_env("SLOTWATCH_TELEGRAM_OPERATOR_CHAT_ID", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("SLOTWATCH_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs =
                parse_env("SLOTWATCH_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SLOTWATCH_SITE_CALENDAR_URL") {
            self.site.calendar_url = value;
        }
        if let Some(value) = read_env("SLOTWATCH_SITE_PHONE") {
            self.site.phone = value;
        }
        if let Some(value) = read_env("SLOTWATCH_SITE_PASSWORD") {
            self.site.password = secret_value(value);
        }

        if let Some(value) = read_env("SLOTWATCH_BROWSER_WEBDRIVER_URL") {
            self.browser.webdriver_url = value;
        }
        if let Some(value) = read_env("SLOTWATCH_BROWSER_HEADLESS") {
            self.browser.headless = parse_env("SLOTWATCH_BROWSER_HEADLESS", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_BROWSER_WAIT_TIMEOUT_SECS") {
            self.browser.wait_timeout_secs =
                parse_env("SLOTWATCH_BROWSER_WAIT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_BROWSER_POLL_INTERVAL_MS") {
            self.browser.poll_interval_ms =
                parse_env("SLOTWATCH_BROWSER_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_BROWSER_MAX_ROUNDS") {
            self.browser.max_rounds = parse_env("SLOTWATCH_BROWSER_MAX_ROUNDS", &value)?;
        }

        if let Some(value) = read_env("SLOTWATCH_SCHEDULER_INTERVAL_HOURS") {
            self.scheduler.interval_hours =
                parse_env("SLOTWATCH_SCHEDULER_INTERVAL_HOURS", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_SCHEDULER_RUN_ON_STARTUP") {
            self.scheduler.run_on_startup =
                parse_env("SLOTWATCH_SCHEDULER_RUN_ON_STARTUP", &value)?;
        }

        if let Some(value) = read_env("SLOTWATCH_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SLOTWATCH_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_env("SLOTWATCH_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("SLOTWATCH_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("SLOTWATCH_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SLOTWATCH_LOGGING_LEVEL").or_else(|| read_env("SLOTWATCH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SLOTWATCH_LOGGING_FORMAT").or_else(|| read_env("SLOTWATCH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(operator_chat_id) = overrides.operator_chat_id {
            self.telegram.operator_chat_id = operator_chat_id;
        }
        if let Some(phone) = overrides.site_phone {
            self.site.phone = phone;
        }
        if let Some(password) = overrides.site_password {
            self.site.password = secret_value(password);
        }
        if let Some(webdriver_url) = overrides.webdriver_url {
            self.browser.webdriver_url = webdriver_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_telegram(&self.telegram)?;
        validate_site(&self.site)?;
        validate_browser(&self.browser)?;
        validate_scheduler(&self.scheduler)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("slotwatch.toml"), PathBuf::from("config/slotwatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Create a bot with @BotFather and copy its token"
                .to_string(),
        ));
    }
    if !bot_token.contains(':') {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if telegram.operator_chat_id == 0 {
        return Err(ConfigError::Validation(
            "telegram.operator_chat_id is required (the chat that receives notifications)"
                .to_string(),
        ));
    }

    require_http_url("telegram.api_base_url", &telegram.api_base_url)?;

    if telegram.poll_timeout_secs == 0 || telegram.poll_timeout_secs > 50 {
        return Err(ConfigError::Validation(
            "telegram.poll_timeout_secs must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    require_http_url("site.calendar_url", &site.calendar_url)?;

    if site.phone.trim().is_empty() {
        return Err(ConfigError::Validation("site.phone is required".to_string()));
    }
    if site.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation("site.password is required".to_string()));
    }

    Ok(())
}

fn validate_browser(browser: &BrowserConfig) -> Result<(), ConfigError> {
    require_http_url("browser.webdriver_url", &browser.webdriver_url)?;

    if browser.wait_timeout_secs == 0 || browser.wait_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "browser.wait_timeout_secs must be in range 1..=120".to_string(),
        ));
    }
    if browser.poll_interval_ms < 10 || browser.poll_interval_ms > 5_000 {
        return Err(ConfigError::Validation(
            "browser.poll_interval_ms must be in range 10..=5000".to_string(),
        ));
    }
    if browser.max_rounds == 0 || browser.max_rounds > 100 {
        return Err(ConfigError::Validation(
            "browser.max_rounds must be in range 1..=100".to_string(),
        ));
    }

    Ok(())
}

fn validate_scheduler(scheduler: &SchedulerConfig) -> Result<(), ConfigError> {
    if scheduler.interval_hours == 0 || scheduler.interval_hours > 168 {
        return Err(ConfigError::Validation(
            "scheduler.interval_hours must be in range 1..=168".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must start with http:// or https://")))
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    telegram: Option<TelegramPatch>,
    site: Option<SitePatch>,
    browser: Option<BrowserPatch>,
    scheduler: Option<SchedulerPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    operator_chat_id: Option<i64>,
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SitePatch {
    calendar_url: Option<String>,
    phone: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BrowserPatch {
    webdriver_url: Option<String>,
    headless: Option<bool>,
    wait_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    max_rounds: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerPatch {
    interval_hours: Option<u64>,
    run_on_startup: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
