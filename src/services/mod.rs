//! Application services.
//!
//! The notification pipeline, one stage per module:
//! - Launch polling under a bounded [`PollPolicy`]
//! - Aggregation into launch summaries
//! - Deduplication against processed launches
//! - Report rendering and dispatch
//! - The scheduling daemon

pub mod aggregator;
pub mod collector;
pub mod dedup;
pub mod dispatcher;
pub mod launch_poller;
pub mod notifier;
pub mod poll_policy;
pub mod report;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{filter_critical, Aggregation, Aggregator};
pub use collector::{CollectionService, CollectorConfig, CycleError};
pub use dedup::{filter_unprocessed, DedupService};
pub use dispatcher::NotificationDispatcher;
pub use launch_poller::{LaunchPoller, PollReport, PollResult};
pub use notifier::{CycleReport, NotifierService};
pub use poll_policy::{PollOutcome, PollPolicy};
pub use report::{escape_markdown, ReportRenderer};
pub use scheduler::{CollectionDaemon, DaemonConfig, DaemonEvent, DaemonHandle, DaemonStatus};
