//! Delivery of cycle reports to subscribers.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::report::ReportRenderer;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CycleOutcome, DispatchReport, Report, SubscriptionKind};
use crate::domain::ports::{MessageTransport, SubscriptionRepository};

/// Sends the full report to `all` subscribers and the critical report to `critical` ones.
pub struct NotificationDispatcher {
    subscriptions: Arc<dyn SubscriptionRepository>,
    transport: Arc<dyn MessageTransport>,
    renderer: ReportRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        transport: Arc<dyn MessageTransport>,
        renderer: ReportRenderer,
    ) -> Self {
        Self {
            subscriptions,
            transport,
            renderer,
        }
    }

    /// Deliver the reports of `outcome`.
    ///
    /// Delivery failures never fail the dispatch: revoked chats are unsubscribed and
    /// every other failure is only recorded. Errors come from the subscription store.
    #[instrument(skip_all, fields(cycle_id = %outcome.cycle_id))]
    pub async fn dispatch(&self, outcome: &CycleOutcome) -> DomainResult<DispatchReport> {
        let mut dispatch = DispatchReport::default();
        if !outcome.has_new_launches() {
            debug!("new launches not found");
            return Ok(dispatch);
        }

        let critical = self.renderer.render_critical(
            &outcome.critical,
            outcome.window_start,
            outcome.window_end,
        );
        dispatch.critical_sent = self.deliver(&critical, &mut dispatch).await?;

        let full = self.renderer.render_full(
            &outcome.summaries,
            outcome.window_start,
            outcome.window_end,
        );
        dispatch.full_sent = self.deliver(&full, &mut dispatch).await?;

        info!(
            full_sent = dispatch.full_sent,
            critical_sent = dispatch.critical_sent,
            unsubscribed = dispatch.unsubscribed.len(),
            failed = dispatch.failed.len(),
            "reports dispatched"
        );
        Ok(dispatch)
    }

    async fn deliver(&self, report: &Report, dispatch: &mut DispatchReport) -> DomainResult<usize> {
        if !report.is_worth_sending() {
            match report.audience {
                SubscriptionKind::Critical => {
                    debug!("launches do not contain a critical share of failed tests");
                }
                SubscriptionKind::All => debug!("launches do not contain failed tests"),
            }
            return Ok(0);
        }

        let recipients = self.subscriptions.list_by_kind(report.audience).await?;
        let mut sent = 0;

        for subscriber in recipients {
            let chat_id = subscriber.chat_id;
            match self.transport.send_report(chat_id, report).await {
                Ok(()) => {
                    debug!(chat_id, audience = %report.audience, "report sent");
                    sent += 1;
                }
                Err(err) if err.is_revoked() => {
                    warn!(chat_id, error = %err, "chat revoked access, unsubscribing");
                    self.subscriptions.unsubscribe(chat_id).await?;
                    dispatch.unsubscribed.push(chat_id);
                }
                Err(err) => {
                    warn!(chat_id, error = %err, "report delivery failed");
                    dispatch.failed.push(chat_id);
                }
            }
        }

        Ok(sent)
    }
}
