//! One collection cycle: authenticate, discover, poll, aggregate, deduplicate.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::aggregator::{filter_critical, Aggregator};
use super::dedup::{filter_unprocessed, DedupService};
use super::launch_poller::LaunchPoller;
use super::poll_policy::PollPolicy;
use crate::domain::errors::{ApiError, AuthError, DomainError};
use crate::domain::models::{Config, CycleOutcome, LaunchId};
use crate::domain::ports::LaunchSource;

/// Floor of the derived polling budget.
const MIN_POLL_BUDGET: Duration = Duration::from_secs(60);

/// Why a cycle produced no outcome at all.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Allure request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Store operation failed: {0}")]
    Store(#[from] DomainError),
}

/// Parameters of a collection cycle.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Launches created within this window before now are searched.
    pub window: TimeDelta,
    pub critical_percent: f64,
    /// Time from cycle start after which polling stops. `None` derives it from the
    /// number of discovered launches, see [`derived_poll_budget`].
    pub cycle_timeout: Option<Duration>,
}

impl CollectorConfig {
    pub fn from_config(config: &Config) -> Self {
        let window_minutes = i64::try_from(config.poll.window_minutes).unwrap_or(i64::MAX);
        let cycle_timeout = (config.report.cycle_timeout_secs > 0)
            .then(|| Duration::from_secs(config.report.cycle_timeout_secs));

        Self {
            window: TimeDelta::try_minutes(window_minutes).unwrap_or(TimeDelta::MAX),
            critical_percent: config.report.critical_percent,
            cycle_timeout,
        }
    }
}

/// Twice the longest wait of `policy` for every wave of `concurrency` launches, never
/// below one minute.
pub fn derived_poll_budget(policy: &PollPolicy, launches: usize, concurrency: usize) -> Duration {
    let waves = u32::try_from(launches.div_ceil(concurrency.max(1))).unwrap_or(u32::MAX);
    policy
        .max_wait()
        .saturating_mul(2)
        .saturating_mul(waves)
        .max(MIN_POLL_BUDGET)
}

pub struct CollectionService {
    source: Arc<dyn LaunchSource>,
    poller: LaunchPoller,
    aggregator: Aggregator,
    dedup: Arc<DedupService>,
    config: CollectorConfig,
}

impl CollectionService {
    pub fn new(
        source: Arc<dyn LaunchSource>,
        dedup: Arc<DedupService>,
        policy: PollPolicy,
        concurrency: usize,
        config: CollectorConfig,
    ) -> Self {
        Self {
            poller: LaunchPoller::new(source.clone(), policy).with_concurrency(concurrency),
            aggregator: Aggregator::new(source.clone()),
            source,
            dedup,
            config,
        }
    }

    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run one cycle. Nothing is persisted here; marking launches happens after dispatch.
    ///
    /// Polling stops once the cycle timeout is reached. Launches that settled by then are
    /// still aggregated; the rest count as timed out and come back next cycle.
    pub async fn collect(&self) -> Result<CycleOutcome, CycleError> {
        let cycle_id = Uuid::new_v4();
        self.run_cycle(cycle_id)
            .instrument(tracing::info_span!("cycle", %cycle_id))
            .await
    }

    async fn run_cycle(&self, cycle_id: Uuid) -> Result<CycleOutcome, CycleError> {
        let started = Instant::now();
        let window_end = Utc::now();
        let window_start = window_end
            .checked_sub_signed(self.config.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut outcome = CycleOutcome::empty(cycle_id, window_start, window_end);

        let credential = self.source.authenticate().await?;
        let launches = self.poller.discover(&credential, window_start).await?;
        outcome.discovered = launches.len();
        if launches.is_empty() {
            debug!("new launches not found");
            return Ok(outcome);
        }

        let budget = self.config.cycle_timeout.unwrap_or_else(|| {
            derived_poll_budget(self.poller.policy(), launches.len(), self.poller.concurrency())
        });
        let polled = self
            .poller
            .poll_all_until(&credential, &launches, started + budget)
            .await?;
        if polled.deadline_reached {
            warn!(budget = ?budget, "cycle timeout reached while polling");
        }
        let aggregation = self.aggregator.aggregate(&credential, &polled.completed).await?;

        let processed = self.dedup.processed_ids().await?;
        let summaries = filter_unprocessed(&aggregation.summaries, &processed);
        outcome.already_processed = aggregation
            .summaries
            .keys()
            .filter(|id| processed.contains(id))
            .copied()
            .collect::<Vec<LaunchId>>();

        outcome.critical = filter_critical(&summaries, self.config.critical_percent);
        outcome.summaries = summaries;
        outcome.timed_out = polled.timed_out;
        outcome.run_failures = aggregation.run_failures;
        outcome.failures = polled.failures;
        outcome.failures.extend(aggregation.failures);

        info!(
            discovered = outcome.discovered,
            summarized = outcome.summaries.len(),
            critical = outcome.critical.len(),
            timed_out = outcome.timed_out.len(),
            run_failures = outcome.run_failures.len(),
            already_processed = outcome.already_processed.len(),
            failures = outcome.failures.len(),
            "cycle collected"
        );
        Ok(outcome)
    }
}
