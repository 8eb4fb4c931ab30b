use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "allure-notifier.yaml";

/// Optional local overrides, not meant to be committed.
pub const LOCAL_CONFIG_FILE: &str = ".allure-notifier/local.yaml";

/// Prefix of environment overrides, e.g. `ALLURE_NOTIFIER_ALLURE__TOKEN`.
pub const ENV_PREFIX: &str = "ALLURE_NOTIFIER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Allure URL cannot be empty")]
    EmptyAllureUrl,

    #[error("Allure project id cannot be empty")]
    EmptyProjectId,

    #[error("Allure user token cannot be empty")]
    EmptyAllureToken,

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid poll retries: {0}. Must be at least 1")]
    InvalidPollRetries(u32),

    #[error("Invalid poll concurrency: {0}. Must be at least 1")]
    InvalidPollConcurrency(usize),

    #[error("Invalid poll interval: {0} seconds. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Invalid poll window: {0} minutes. Must be at least 1")]
    InvalidPollWindow(u64),

    #[error("Invalid report interval: {0} seconds. Must be at least 1")]
    InvalidReportInterval(u64),

    #[error("Invalid critical percent: {0}. Must be between 0 and 100")]
    InvalidCriticalPercent(f64),

    #[error("Invalid reset hour: {0}. Must be between 0 and 23")]
    InvalidResetHour(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Telegram bot token cannot be empty")]
    EmptyBotToken,

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. allure-notifier.yaml (project config)
    /// 3. .allure-notifier/local.yaml (local overrides, optional)
    /// 4. Environment variables (ALLURE_NOTIFIER_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_with(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`ConfigLoader::load`] with a custom project config file
    pub fn load_with(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Self::figment(path.as_ref())
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.allure.url.trim().is_empty() {
            return Err(ConfigError::EmptyAllureUrl);
        }
        if config.allure.project_id.trim().is_empty() {
            return Err(ConfigError::EmptyProjectId);
        }
        if config.allure.token.trim().is_empty() {
            return Err(ConfigError::EmptyAllureToken);
        }
        if config.allure.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.allure.max_attempts));
        }

        if config.poll.retries == 0 {
            return Err(ConfigError::InvalidPollRetries(config.poll.retries));
        }
        if config.poll.interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(config.poll.interval_secs));
        }
        if config.poll.concurrency == 0 {
            return Err(ConfigError::InvalidPollConcurrency(config.poll.concurrency));
        }
        if config.poll.window_minutes == 0 {
            return Err(ConfigError::InvalidPollWindow(config.poll.window_minutes));
        }

        if config.report.interval_secs == 0 {
            return Err(ConfigError::InvalidReportInterval(config.report.interval_secs));
        }
        if !(0.0..=100.0).contains(&config.report.critical_percent) {
            return Err(ConfigError::InvalidCriticalPercent(
                config.report.critical_percent,
            ));
        }

        if config.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::EmptyBotToken);
        }

        if config.dedup.reset_hour_utc > 23 {
            return Err(ConfigError::InvalidResetHour(config.dedup.reset_hour_utc));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
