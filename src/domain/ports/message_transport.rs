//! Port for delivering rendered reports to chats.

use async_trait::async_trait;

use crate::domain::errors::DeliveryError;
use crate::domain::models::Report;

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver `report` to one chat.
    async fn send_report(&self, chat_id: i64, report: &Report) -> Result<(), DeliveryError>;
}
