//! Repository port for report subscriptions.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Subscriber, SubscriptionKind};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create or replace the subscription of a chat, returning the previous kind.
    async fn subscribe(&self, subscriber: &Subscriber) -> DomainResult<Option<SubscriptionKind>>;

    /// Remove the subscription of a chat. Returns false if it had none.
    async fn unsubscribe(&self, chat_id: i64) -> DomainResult<bool>;

    async fn get(&self, chat_id: i64) -> DomainResult<Option<Subscriber>>;

    async fn list(&self) -> DomainResult<Vec<Subscriber>>;

    async fn list_by_kind(&self, kind: SubscriptionKind) -> DomainResult<Vec<Subscriber>>;
}
