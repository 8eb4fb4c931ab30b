//! Outcome records of a collection cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::launch::LaunchId;
use super::summary::SummaryMap;

/// Pipeline step during which a launch-level failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Polling,
    Aggregation,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => f.write_str("polling"),
            Self::Aggregation => f.write_str("aggregation"),
        }
    }
}

/// A launch excluded from the cycle because one of its upstream calls failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchFailure {
    pub launch_id: LaunchId,
    pub stage: CycleStage,
    pub error: String,
}

/// Everything one collection cycle produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub cycle_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Number of launches returned by the search.
    pub discovered: usize,
    /// Finished launches not reported before.
    pub summaries: SummaryMap,
    /// Subset of `summaries` above the critical threshold.
    pub critical: SummaryMap,
    /// Launches still running after the polling budget.
    pub timed_out: Vec<LaunchId>,
    /// Launches that ended in `run_failure`.
    pub run_failures: Vec<LaunchId>,
    /// Launches dropped because they were already reported.
    pub already_processed: Vec<LaunchId>,
    pub failures: Vec<LaunchFailure>,
}

impl CycleOutcome {
    /// An outcome for a cycle whose search found nothing.
    pub fn empty(cycle_id: Uuid, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            cycle_id,
            window_start,
            window_end,
            discovered: 0,
            summaries: SummaryMap::new(),
            critical: SummaryMap::new(),
            timed_out: Vec::new(),
            run_failures: Vec::new(),
            already_processed: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn has_new_launches(&self) -> bool {
        !self.summaries.is_empty()
    }
}

/// Deliveries made by the dispatcher for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub full_sent: usize,
    pub critical_sent: usize,
    /// Chats unsubscribed because the transport reported them as revoked.
    pub unsubscribed: Vec<i64>,
    /// Chats whose delivery failed for any other reason.
    pub failed: Vec<i64>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.full_sent + self.critical_sent
    }
}
