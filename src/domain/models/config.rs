use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration structure for the notifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Allure TestOps connection
    #[serde(default)]
    pub allure: AllureConfig,

    /// Launch discovery and status polling
    #[serde(default)]
    pub poll: PollConfig,

    /// Report classification and cycle cadence
    #[serde(default)]
    pub report: ReportConfig,

    /// Processed launch store
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Telegram delivery
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Allure TestOps connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AllureConfig {
    /// Base URL, e.g. `https://allure.example.com`
    #[serde(default)]
    pub url: String,

    /// Project whose launches are reported
    #[serde(default)]
    pub project_id: String,

    /// User API token exchanged for a bearer token every cycle
    #[serde(default)]
    pub token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request when upstream answers with a retryable status
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}

impl Default for AllureConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            project_id: String::new(),
            token: String::new(),
            timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl fmt::Debug for AllureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllureConfig")
            .field("url", &self.url)
            .field("project_id", &self.project_id)
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Launch polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// How far back each cycle searches for new launches
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Status checks per launch before giving up for this cycle
    #[serde(default = "default_poll_retries")]
    pub retries: u32,

    /// Delay between status checks in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Launches polled at the same time (1 = one after another)
    #[serde(default = "default_poll_concurrency")]
    pub concurrency: usize,
}

const fn default_window_minutes() -> u64 {
    200
}

const fn default_poll_retries() -> u32 {
    50
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_poll_concurrency() -> usize {
    1
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            retries: default_poll_retries(),
            interval_secs: default_poll_interval_secs(),
            concurrency: default_poll_concurrency(),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportConfig {
    /// Failure percentage above which a launch goes to the critical channel
    #[serde(default = "default_critical_percent")]
    pub critical_percent: f64,

    /// Seconds between collection cycles
    #[serde(default = "default_report_interval_secs")]
    pub interval_secs: u64,

    /// Seconds of polling per cycle before unsettled launches are deferred (0 derives it from the launch count)
    #[serde(default)]
    pub cycle_timeout_secs: u64,
}

const fn default_critical_percent() -> f64 {
    50.0
}

const fn default_report_interval_secs() -> u64 {
    20
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            critical_percent: default_critical_percent(),
            interval_secs: default_report_interval_secs(),
            cycle_timeout_secs: 0,
        }
    }
}

/// Processed launch store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DedupConfig {
    /// Skip launches that were already reported
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Clear the store once a day
    #[serde(default = "default_true")]
    pub reset_enabled: bool,

    /// UTC hour of the daily reset
    #[serde(default = "default_reset_hour_utc")]
    pub reset_hour_utc: u32,
}

const fn default_true() -> bool {
    true
}

const fn default_reset_hour_utc() -> u32 {
    20
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reset_enabled: true,
            reset_hour_utc: default_reset_hour_utc(),
        }
    }
}

/// Telegram Bot API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelegramConfig {
    /// Token issued by BotFather
    #[serde(default)]
    pub bot_token: String,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: default_telegram_api_url(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".allure-notifier/notifier.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
