//! Repository port for launches that were already reported.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::errors::DomainResult;
use crate::domain::models::LaunchId;

/// Durable set of launch ids that subscribers were notified about.
#[async_trait]
pub trait ProcessedLaunchRepository: Send + Sync {
    /// All launch ids recorded so far.
    async fn list_ids(&self) -> DomainResult<BTreeSet<LaunchId>>;

    /// Record launch ids. Ids already present are left untouched.
    async fn upsert_many(&self, ids: &[LaunchId]) -> DomainResult<()>;

    /// Drop every recorded id, returning how many were removed.
    async fn clear(&self) -> DomainResult<u64>;
}
