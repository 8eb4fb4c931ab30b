//! Wiring of configured services for the commands.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::sqlite::{
    database_url, initialize_database, PoolConfig, SqliteProcessedLaunchRepository,
    SqliteSubscriptionRepository,
};
use crate::domain::models::Config;
use crate::infrastructure::allure::{AllureClient, AllureClientConfig};
use crate::infrastructure::config::{ConfigLoader, DEFAULT_CONFIG_FILE};
use crate::infrastructure::telegram::TelegramTransport;
use crate::services::{
    CollectionService, CollectorConfig, DedupService, NotificationDispatcher, NotifierService,
    PollPolicy, ReportRenderer,
};

/// Load and validate configuration from `path`, or the default project file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_with(path),
        None => ConfigLoader::load_with(DEFAULT_CONFIG_FILE),
    }
}

/// Configuration plus an open, migrated database.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
}

impl AppContext {
    pub async fn open(config: Config) -> Result<Self> {
        let url = database_url(&config.database.path);
        let pool = initialize_database(&url, &PoolConfig::from(&config.database))
            .await
            .context("Failed to initialize database")?;

        Ok(Self { config, pool })
    }

    pub fn subscriptions(&self) -> Arc<SqliteSubscriptionRepository> {
        Arc::new(SqliteSubscriptionRepository::new(self.pool.clone()))
    }

    pub fn dedup(&self) -> Arc<DedupService> {
        Arc::new(DedupService::new(
            Arc::new(SqliteProcessedLaunchRepository::new(self.pool.clone())),
            self.config.dedup.enabled,
        ))
    }

    /// Build the full notification pipeline against Allure and Telegram.
    pub fn notifier(&self) -> Result<NotifierService> {
        let config = &self.config;
        let source = Arc::new(
            AllureClient::new(AllureClientConfig::from(&config.allure))
                .context("Failed to create Allure client")?,
        );
        let transport = Arc::new(
            TelegramTransport::new(&config.telegram).context("Failed to create Telegram transport")?,
        );
        let dedup = self.dedup();

        let collector = CollectionService::new(
            source,
            dedup.clone(),
            PollPolicy::new(config.poll.retries, Duration::from_secs(config.poll.interval_secs)),
            config.poll.concurrency,
            CollectorConfig::from_config(config),
        );
        let dispatcher = NotificationDispatcher::new(
            self.subscriptions(),
            transport,
            ReportRenderer::from_config(&config.allure.url, &config.allure.project_id, &config.report),
        );

        Ok(NotifierService::new(collector, dispatcher, dedup))
    }
}
