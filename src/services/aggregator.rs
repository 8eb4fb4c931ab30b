//! Joins per-launch reads into launch summaries.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::domain::errors::ApiError;
use crate::domain::models::{
    CycleStage, LaunchFailure, LaunchId, LaunchRef, LaunchStatus, LaunchSummary, SummaryMap,
};
use crate::domain::ports::{Credential, LaunchSource};

/// Summaries built from one batch of polled launches.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub summaries: SummaryMap,
    /// Launches dropped because they ended in `run_failure`.
    pub run_failures: Vec<LaunchId>,
    /// Launches dropped because one of their reads failed.
    pub failures: Vec<LaunchFailure>,
}

/// Turns terminal launches into summaries.
pub struct Aggregator {
    source: Arc<dyn LaunchSource>,
}

impl Aggregator {
    /// Aggregator reading statistics and defects from `source`.
    pub fn new(source: Arc<dyn LaunchSource>) -> Self {
        Self { source }
    }

    /// Build a summary for every `finished` launch.
    ///
    /// `run_failure` launches are left out without a report. Returns early only when
    /// upstream rejects the credential.
    #[instrument(skip_all, fields(launches = launches.len()))]
    pub async fn aggregate(
        &self,
        credential: &Credential,
        launches: &[LaunchRef],
    ) -> Result<Aggregation, ApiError> {
        let mut aggregation = Aggregation::default();

        for launch in launches {
            match launch.status {
                LaunchStatus::Finished => {}
                LaunchStatus::RunFailure => {
                    debug!(launch_id = %launch.id, name = %launch.name, "run_failure launch excluded from reports");
                    aggregation.run_failures.push(launch.id);
                    continue;
                }
                status => {
                    debug!(launch_id = %launch.id, %status, "launch is not terminal, not aggregated");
                    continue;
                }
            }

            match self.summarize(credential, launch).await {
                Ok(summary) => {
                    aggregation.summaries.insert(launch.id, summary);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        launch_id = %launch.id,
                        endpoint = err.endpoint(),
                        status = ?err.status(),
                        error = %err,
                        "launch aggregation failed, launch excluded"
                    );
                    aggregation.failures.push(LaunchFailure {
                        launch_id: launch.id,
                        stage: CycleStage::Aggregation,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(aggregation)
    }

    async fn summarize(
        &self,
        credential: &Credential,
        launch: &LaunchRef,
    ) -> Result<LaunchSummary, ApiError> {
        let (test_results, statistic, defects) = tokio::try_join!(
            self.source.fetch_leaf_results(credential, launch.id),
            self.source.fetch_statistic(credential, launch.id),
            self.source.fetch_defects(credential, launch.id),
        )?;

        Ok(LaunchSummary::new(launch.id, launch.name.clone())
            .with_test_results(test_results)
            .with_statistic(statistic)
            .with_defects(defects))
    }
}

/// Summaries whose failure rate is strictly above `threshold_percent`.
///
/// Launches without passed, broken or failed tests never qualify.
pub fn filter_critical(summaries: &SummaryMap, threshold_percent: f64) -> SummaryMap {
    summaries
        .iter()
        .filter(|(_, summary)| summary.is_critical(threshold_percent))
        .map(|(id, summary)| (*id, summary.clone()))
        .collect()
}
