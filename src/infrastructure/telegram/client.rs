use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::DeliveryError;
use crate::domain::models::{Report, TelegramConfig};
use crate::domain::ports::MessageTransport;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Sends reports with `sendMessage` of the Telegram Bot API.
pub struct TelegramTransport {
    http_client: ReqwestClient,
    api_url: String,
    bot_token: String,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig) -> anyhow::Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send_report(&self, chat_id: i64, report: &Report) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id,
            text: &report.message,
            parse_mode: "MarkdownV2",
            disable_web_page_preview: true,
        };

        let response = self
            .http_client
            .post(self.endpoint("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network {
                chat_id,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id, audience = %report.audience, "report delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_delivery(chat_id, status, body))
    }
}

/// Telegram answers 403 when the bot was blocked or kicked, and 400 "chat not found"
/// for chats that no longer exist. Both mean the subscription is dead.
fn classify_delivery(chat_id: i64, status: StatusCode, body: String) -> DeliveryError {
    let chat_gone = status == StatusCode::BAD_REQUEST && body.contains("chat not found");
    if status == StatusCode::FORBIDDEN || chat_gone {
        DeliveryError::Revoked {
            chat_id,
            reason: body,
        }
    } else {
        DeliveryError::Rejected {
            chat_id,
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_revoked() {
        let err = classify_delivery(
            1,
            StatusCode::FORBIDDEN,
            r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#
                .to_string(),
        );
        assert!(err.is_revoked());
    }

    #[test]
    fn test_chat_not_found_is_revoked() {
        let err = classify_delivery(
            1,
            StatusCode::BAD_REQUEST,
            r#"{"ok":false,"description":"Bad Request: chat not found"}"#.to_string(),
        );
        assert!(err.is_revoked());
    }

    #[test]
    fn test_bad_markdown_is_rejected() {
        let err = classify_delivery(
            1,
            StatusCode::BAD_REQUEST,
            r#"{"ok":false,"description":"Bad Request: can't parse entities"}"#.to_string(),
        );
        assert!(matches!(err, DeliveryError::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_endpoint_contains_token() {
        let transport = TelegramTransport::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_url: "https://api.telegram.org/".to_string(),
        })
        .unwrap();
        assert_eq!(
            transport.endpoint("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
