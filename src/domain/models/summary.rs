//! Per-launch summary built once a launch has finished.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::launch::LaunchId;

/// Summaries of one collection cycle, keyed by launch id.
pub type SummaryMap = BTreeMap<LaunchId, LaunchSummary>;

/// Statistic categories the notifier counts.
pub const PASSED: &str = "passed";
pub const FAILED: &str = "failed";
pub const BROKEN: &str = "broken";

/// A single leaf test result of a launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case_id: Option<i64>,
    pub test_case_launch_id: i64,
    pub name: String,
    pub status: Option<String>,
}

/// Outcome category counts of a launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistic {
    counts: BTreeMap<String, u64>,
}

impl Statistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to a category. Repeated categories accumulate.
    pub fn record(&mut self, category: impl Into<String>, count: u64) {
        *self.counts.entry(category.into()).or_insert(0) += count;
    }

    #[must_use]
    pub fn with(mut self, category: &str, count: u64) -> Self {
        self.record(category, count);
        self
    }

    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn passed(&self) -> u64 {
        self.count(PASSED)
    }

    pub fn failed(&self) -> u64 {
        self.count(FAILED)
    }

    pub fn broken(&self) -> u64 {
        self.count(BROKEN)
    }

    /// Tests that count towards the failure rate: passed, broken and failed.
    pub fn total(&self) -> u64 {
        self.passed() + self.broken() + self.failed()
    }

    /// Percentage of broken and failed tests, or `None` when the launch has no tests.
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.broken() + self.failed()) as f64 / total as f64 * 100.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// A defect linked to a launch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Defect {
    pub id: i64,
    pub name: String,
}

/// Everything the reports need to know about one finished launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSummary {
    pub id: LaunchId,
    pub name: String,
    pub test_results: Vec<TestResult>,
    pub statistic: Statistic,
    pub defects: BTreeSet<Defect>,
}

impl LaunchSummary {
    pub fn new(id: LaunchId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            test_results: Vec::new(),
            statistic: Statistic::default(),
            defects: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    #[must_use]
    pub fn with_defects(mut self, defects: impl IntoIterator<Item = Defect>) -> Self {
        self.defects = defects.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_test_results(mut self, results: Vec<TestResult>) -> Self {
        self.test_results = results;
        self
    }

    /// Whether the launch escalates to the critical channel at `threshold_percent`.
    ///
    /// Launches without any passed, broken or failed test are never critical.
    pub fn is_critical(&self, threshold_percent: f64) -> bool {
        self.statistic
            .failure_rate()
            .is_some_and(|rate| rate > threshold_percent)
    }
}
