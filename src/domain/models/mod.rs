pub mod config;
pub mod cycle;
pub mod launch;
pub mod report;
pub mod subscription;
pub mod summary;

pub use config::{
    AllureConfig, Config, DatabaseConfig, DedupConfig, LoggingConfig, PollConfig, ReportConfig,
    TelegramConfig,
};
pub use cycle::{CycleOutcome, CycleStage, DispatchReport, LaunchFailure};
pub use launch::{LaunchId, LaunchRef, LaunchStatus, LaunchStatusReport};
pub use report::{Report, ReportTotals};
pub use subscription::{Subscriber, SubscriptionKind};
pub use summary::{Defect, LaunchSummary, Statistic, SummaryMap, TestResult};
