//! Launch discovery and per-launch status polling.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::pin::pin;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::poll_policy::{PollOutcome, PollPolicy};
use crate::domain::errors::ApiError;
use crate::domain::models::{CycleStage, LaunchFailure, LaunchId, LaunchRef, LaunchStatusReport};
use crate::domain::ports::{Credential, LaunchSource};

/// How polling one launch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// The launch reached `finished` or `run_failure`.
    Terminal(LaunchStatusReport),
    /// Still running after the whole budget; skipped for this cycle.
    TimedOut { attempts: u32 },
}

/// Launches of one cycle, sorted by how polling ended for them.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    /// Launches that reached a terminal status, carrying that status.
    pub completed: Vec<LaunchRef>,
    pub timed_out: Vec<LaunchId>,
    /// Launches whose status could not be read.
    pub failures: Vec<LaunchFailure>,
    /// Polling stopped at the deadline before every launch settled.
    pub deadline_reached: bool,
}

pub struct LaunchPoller {
    source: Arc<dyn LaunchSource>,
    policy: PollPolicy,
    concurrency: usize,
}

impl LaunchPoller {
    /// Poller that polls one launch at a time.
    pub fn new(source: Arc<dyn LaunchSource>, policy: PollPolicy) -> Self {
        Self {
            source,
            policy,
            concurrency: 1,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Launches created after `window_start`. Every returned launch starts as `Unknown`.
    #[instrument(skip(self, credential))]
    pub async fn discover(
        &self,
        credential: &Credential,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<LaunchRef>, ApiError> {
        let launches = self
            .source
            .search_recent_launches(credential, window_start)
            .await?;
        debug!(count = launches.len(), "launches discovered");
        Ok(launches)
    }

    /// Query the status of `launch_id` until it is terminal or the budget is spent.
    pub async fn poll_until_terminal(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<PollResult, ApiError> {
        let outcome = self
            .policy
            .run(
                || self.source.fetch_status(credential, launch_id),
                |report: &LaunchStatusReport| report.status.is_terminal(),
            )
            .await?;

        Ok(match outcome {
            PollOutcome::Completed { value, attempts } => {
                debug!(launch_id = %launch_id, status = %value.status, attempts, "launch is terminal");
                PollResult::Terminal(value)
            }
            PollOutcome::Exhausted { attempts } => {
                info!(launch_id = %launch_id, attempts, "launch still running, skipped this cycle");
                PollResult::TimedOut { attempts }
            }
        })
    }

    /// Poll every launch, `concurrency` at a time.
    ///
    /// A failed status read excludes that launch only. An unauthorized answer aborts the
    /// whole poll, dropping launches still in flight.
    pub async fn poll_all(
        &self,
        credential: &Credential,
        launches: &[LaunchRef],
    ) -> Result<PollReport, ApiError> {
        self.poll_within(credential, launches, None).await
    }

    /// Same as [`LaunchPoller::poll_all`], but stops at `deadline`.
    ///
    /// Launches that settled before the deadline keep their result; the ones still being
    /// polled, or not polled yet, are reported as timed out.
    pub async fn poll_all_until(
        &self,
        credential: &Credential,
        launches: &[LaunchRef],
        deadline: Instant,
    ) -> Result<PollReport, ApiError> {
        self.poll_within(credential, launches, Some(deadline)).await
    }

    #[instrument(skip_all, fields(launches = launches.len(), concurrency = self.concurrency))]
    async fn poll_within(
        &self,
        credential: &Credential,
        launches: &[LaunchRef],
        deadline: Option<Instant>,
    ) -> Result<PollReport, ApiError> {
        let polls: Vec<_> = launches
            .iter()
            .map(|launch| async move {
                let result = self.poll_until_terminal(credential, launch.id).await;
                (launch, result)
            })
            .collect();
        let mut polls = pin!(stream::iter(polls).buffered(self.concurrency));

        let mut report = PollReport::default();
        let mut settled = 0;
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, polls.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        report.deadline_reached = true;
                        break;
                    }
                },
                None => polls.next().await,
            };
            let Some((launch, result)) = next else {
                break;
            };
            settled += 1;

            match result {
                Ok(PollResult::Terminal(status)) => {
                    report.completed.push(launch.with_status(status.status));
                }
                Ok(PollResult::TimedOut { .. }) => report.timed_out.push(launch.id),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        launch_id = %launch.id,
                        endpoint = err.endpoint(),
                        status = ?err.status(),
                        error = %err,
                        "status polling failed, launch excluded"
                    );
                    report.failures.push(LaunchFailure {
                        launch_id: launch.id,
                        stage: CycleStage::Polling,
                        error: err.to_string(),
                    });
                }
            }
        }

        if report.deadline_reached {
            let skipped = &launches[settled..];
            warn!(skipped = skipped.len(), "poll deadline reached, remaining launches skipped this cycle");
            report.timed_out.extend(skipped.iter().map(|launch| launch.id));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LaunchStatus;
    use crate::services::testing::FakeSource;
    use std::time::Duration;

    fn poller(source: Arc<FakeSource>, attempts: u32) -> LaunchPoller {
        LaunchPoller::new(source, PollPolicy::new(attempts, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_discovered_launches_start_unknown() {
        let source = Arc::new(FakeSource::new().with_launch(1, "Smoke", &["finished"]));
        let launches = poller(source, 3)
            .discover(&Credential::new("t"), Utc::now())
            .await
            .unwrap();

        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].status, LaunchStatus::Unknown);
    }

    #[tokio::test]
    async fn test_polls_until_finished() {
        let source = Arc::new(FakeSource::new().with_launch(
            1,
            "Smoke",
            &["running", "running", "finished"],
        ));
        let result = poller(source.clone(), 50)
            .poll_until_terminal(&Credential::new("t"), LaunchId(1))
            .await
            .unwrap();

        assert!(matches!(
            result,
            PollResult::Terminal(LaunchStatusReport {
                status: LaunchStatus::Finished,
                ..
            })
        ));
        assert_eq!(source.status_calls(1), 3);
    }

    #[tokio::test]
    async fn test_times_out_after_budget() {
        let source = Arc::new(FakeSource::new().with_launch(1, "Nightly", &["running"]));
        let result = poller(source.clone(), 5)
            .poll_until_terminal(&Credential::new("t"), LaunchId(1))
            .await
            .unwrap();

        assert_eq!(result, PollResult::TimedOut { attempts: 5 });
        assert_eq!(source.status_calls(1), 5);
    }

    #[tokio::test]
    async fn test_budget_is_per_launch() {
        let source = Arc::new(
            FakeSource::new()
                .with_launch(1, "Slow", &["running", "running", "finished"])
                .with_launch(2, "Also slow", &["running", "running", "finished"]),
        );
        let launches = vec![source.launch(1), source.launch(2)];

        let report = poller(source.clone(), 3)
            .poll_all(&Credential::new("t"), &launches)
            .await
            .unwrap();

        assert_eq!(report.completed.len(), 2);
        assert!(report.timed_out.is_empty());
    }

    #[tokio::test]
    async fn test_poll_all_sorts_outcomes() {
        let source = Arc::new(
            FakeSource::new()
                .with_launch(1, "Smoke", &["finished"])
                .with_launch(2, "Broken infra", &["run_failure"])
                .with_launch(3, "Endless", &["running"])
                .with_launch(4, "Flaky api", &["finished"])
                .failing_status(4),
        );
        let launches: Vec<_> = (1..=4).map(|id| source.launch(id)).collect();

        let report = poller(source, 2)
            .with_concurrency(3)
            .poll_all(&Credential::new("t"), &launches)
            .await
            .unwrap();

        let completed: Vec<_> = report.completed.iter().map(|l| (l.id, l.status)).collect();
        assert_eq!(
            completed,
            vec![
                (LaunchId(1), LaunchStatus::Finished),
                (LaunchId(2), LaunchStatus::RunFailure)
            ]
        );
        assert_eq!(report.timed_out, vec![LaunchId(3)]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].launch_id, LaunchId(4));
        assert_eq!(report.failures[0].stage, CycleStage::Polling);
    }

    #[tokio::test]
    async fn test_unauthorized_aborts_poll() {
        let source = Arc::new(
            FakeSource::new()
                .with_launch(1, "Smoke", &["finished"])
                .with_launch(2, "Regress", &["finished"])
                .unauthorized_status(2),
        );
        let launches = vec![source.launch(1), source.launch(2)];

        let result = poller(source, 3)
            .poll_all(&Credential::new("t"), &launches)
            .await;

        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_deadline_keeps_settled_launches() {
        let source = Arc::new(
            FakeSource::new()
                .with_launch(1, "Smoke", &["finished"])
                .with_launch(2, "Stuck", &["running"])
                .with_launch(3, "Queued", &["finished"]),
        );
        let launches = vec![source.launch(1), source.launch(2), source.launch(3)];
        let poller = LaunchPoller::new(source.clone(), PollPolicy::new(50, Duration::from_millis(50)));

        let report = poller
            .poll_all_until(
                &Credential::new("t"),
                &launches,
                Instant::now() + Duration::from_millis(200),
            )
            .await
            .unwrap();

        assert!(report.deadline_reached);
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].id, LaunchId(1));
        assert_eq!(report.timed_out, vec![LaunchId(2), LaunchId(3)]);
        assert_eq!(source.status_calls(3), 0);
    }

    #[tokio::test]
    async fn test_poll_all_runs_on_spawned_task() {
        let source = Arc::new(
            FakeSource::new()
                .with_launch(1, "Smoke", &["running", "finished"])
                .with_launch(2, "Regress", &["finished"]),
        );
        let launches = vec![source.launch(1), source.launch(2)];
        let poller = Arc::new(poller(source, 3).with_concurrency(2));

        let report = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_all(&Credential::new("t"), &launches).await }
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(report.completed.len(), 2);
        assert!(!report.deadline_reached);
    }
}
