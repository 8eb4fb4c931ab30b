//! Rendered reports handed to the message transport.

use serde::{Deserialize, Serialize};

use super::subscription::SubscriptionKind;

/// Test counts summed over every launch of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub passed: u64,
    pub failed: u64,
    pub broken: u64,
}

impl ReportTotals {
    pub const fn has_failures(&self) -> bool {
        self.failed > 0 || self.broken > 0
    }
}

/// A report ready to be delivered to one group of subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Subscribers of this kind receive the report.
    pub audience: SubscriptionKind,
    /// MarkdownV2 message body.
    pub message: String,
    pub totals: ReportTotals,
    /// Number of launches covered by the report.
    pub launch_count: usize,
}

impl Report {
    /// Reports without failed or broken tests are not sent.
    pub const fn is_worth_sending(&self) -> bool {
        self.totals.has_failures()
    }
}
