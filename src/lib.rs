//! allure-notifier - Allure TestOps launch reports for Telegram
//!
//! Polls Allure TestOps for recently finished launches, aggregates their test
//! statistics and defects, and sends a summary to subscribed chats on a schedule.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports and errors
//! - **Adapters** (`adapters`): `SQLite` persistence of processed launches and subscriptions
//! - **Infrastructure Layer** (`infrastructure`): Allure and Telegram clients, config, logging
//! - **Service Layer** (`services`): The polling, aggregation and dispatch pipeline
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ApiError, AuthError, DeliveryError, DomainError, DomainResult};
pub use domain::models::{
    Config, CycleOutcome, LaunchId, LaunchRef, LaunchStatus, LaunchSummary, Report, Statistic,
    Subscriber, SubscriptionKind, SummaryMap,
};
pub use domain::ports::{
    Credential, LaunchSource, MessageTransport, ProcessedLaunchRepository, SubscriptionRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CollectionDaemon, CycleError, NotifierService};
