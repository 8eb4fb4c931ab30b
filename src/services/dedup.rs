//! Deduplication against launches that were already reported.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::DomainResult;
use crate::domain::models::{LaunchId, SummaryMap};
use crate::domain::ports::ProcessedLaunchRepository;

/// Front of the processed launch store. When disabled the store is never touched.
pub struct DedupService {
    repository: Arc<dyn ProcessedLaunchRepository>,
    enabled: bool,
}

impl DedupService {
    pub fn new(repository: Arc<dyn ProcessedLaunchRepository>, enabled: bool) -> Self {
        Self {
            repository,
            enabled,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Ids of launches reported by earlier cycles. Empty when disabled.
    pub async fn processed_ids(&self) -> DomainResult<BTreeSet<LaunchId>> {
        if !self.enabled {
            return Ok(BTreeSet::new());
        }
        self.repository.list_ids().await
    }

    /// Record every summarized launch as reported. Returns how many ids were written.
    pub async fn mark_processed(&self, summaries: &SummaryMap) -> DomainResult<usize> {
        if !self.enabled || summaries.is_empty() {
            return Ok(0);
        }

        let ids: Vec<LaunchId> = summaries.keys().copied().collect();
        self.repository.upsert_many(&ids).await?;
        debug!(count = ids.len(), "launches marked as processed");
        Ok(ids.len())
    }

    /// Forget every processed launch.
    pub async fn reset_all(&self) -> DomainResult<u64> {
        let cleared = self.repository.clear().await?;
        info!(cleared, "processed launch store cleared");
        Ok(cleared)
    }
}

/// Summaries whose launch is not in `processed`.
pub fn filter_unprocessed(summaries: &SummaryMap, processed: &BTreeSet<LaunchId>) -> SummaryMap {
    summaries
        .iter()
        .filter(|(id, _)| !processed.contains(id))
        .map(|(id, summary)| (*id, summary.clone()))
        .collect()
}
