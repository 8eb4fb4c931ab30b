//! Launch domain model.
//!
//! A launch is one execution of a test suite tracked by Allure TestOps. The
//! notifier only ever reads launches; the upstream service owns their lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream identifier of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchId(pub i64);

impl LaunchId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LaunchId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Status of a launch as observed by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStatus {
    /// Discovered but not polled yet.
    Unknown,
    /// Upstream reports the launch is still running (or any stage we do not recognise).
    Pending,
    /// Launch completed and produced test results.
    Finished,
    /// Launch failed at the infrastructure level.
    RunFailure,
}

impl LaunchStatus {
    /// Map the `stage` field of the `/launch/{id}/job` response to a status.
    pub fn from_stage(stage: &str) -> Self {
        match stage {
            "finished" => Self::Finished,
            "run_failure" => Self::RunFailure,
            _ => Self::Pending,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::RunFailure)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Pending => "pending",
            Self::Finished => "finished",
            Self::RunFailure => "run_failure",
        }
    }
}

impl fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A launch returned by the recent-launches search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRef {
    pub id: LaunchId,
    pub name: String,
    pub status: LaunchStatus,
}

impl LaunchRef {
    /// Create a freshly discovered launch. Its status is `Unknown` until polled.
    pub fn discovered(id: LaunchId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: LaunchStatus::Unknown,
        }
    }

    /// Return a copy of this launch carrying the observed status.
    #[must_use]
    pub fn with_status(&self, status: LaunchStatus) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            status,
        }
    }
}

/// Result of a single `/launch/{id}/job` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchStatusReport {
    pub status: LaunchStatus,
    pub error_message: Option<String>,
}

impl LaunchStatusReport {
    pub const fn pending() -> Self {
        Self {
            status: LaunchStatus::Pending,
            error_message: None,
        }
    }

    pub const fn terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
