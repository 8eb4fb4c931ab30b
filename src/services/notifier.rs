//! The full notification cycle: collect, dispatch, then mark as processed.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::collector::{CollectionService, CycleError};
use super::dedup::DedupService;
use super::dispatcher::NotificationDispatcher;
use crate::domain::models::{CycleOutcome, DispatchReport};

/// Result of one complete cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub dispatch: DispatchReport,
    /// Launch ids written to the processed store.
    pub marked: usize,
}

pub struct NotifierService {
    collector: CollectionService,
    dispatcher: NotificationDispatcher,
    dedup: Arc<DedupService>,
}

impl NotifierService {
    pub fn new(
        collector: CollectionService,
        dispatcher: NotificationDispatcher,
        dedup: Arc<DedupService>,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            dedup,
        }
    }

    /// Collect, dispatch, then mark the dispatched launches as processed.
    ///
    /// A crash between dispatch and marking redelivers the same launches next cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let outcome = self.collector.collect().await?;
        let dispatch = self.dispatcher.dispatch(&outcome).await?;
        let marked = self.dedup.mark_processed(&outcome.summaries).await?;

        info!(
            cycle_id = %outcome.cycle_id,
            delivered = dispatch.delivered(),
            marked,
            "cycle finished"
        );
        Ok(CycleReport {
            outcome,
            dispatch,
            marked,
        })
    }

    /// Collect without dispatching or marking anything.
    pub async fn collect_only(&self) -> Result<CycleOutcome, CycleError> {
        self.collector.collect().await
    }

    /// Clear the processed launch store.
    pub async fn reset_processed(&self) -> Result<u64, CycleError> {
        Ok(self.dedup.reset_all().await?)
    }

    pub fn dedup(&self) -> &DedupService {
        &self.dedup
    }
}
