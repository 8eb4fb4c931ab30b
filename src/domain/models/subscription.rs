//! Chat recipients of the reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which report a chat receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    /// Every launch with failed or broken tests.
    All,
    /// Only launches above the critical threshold.
    Critical,
}

impl SubscriptionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown subscription kind: {other}")),
        }
    }
}

/// A chat subscribed to one of the reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub kind: SubscriptionKind,
    /// Group title, for group chats.
    pub title: Option<String>,
    /// Username, for private chats.
    pub username: Option<String>,
}

impl Subscriber {
    pub const fn new(chat_id: i64, kind: SubscriptionKind) -> Self {
        Self {
            chat_id,
            kind,
            title: None,
            username: None,
        }
    }
}
