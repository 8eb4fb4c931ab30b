//! SQLite implementation of the SubscriptionRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Subscriber, SubscriptionKind};
use crate::domain::ports::SubscriptionRepository;

#[derive(Clone)]
pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    chat_id: i64,
    kind: String,
    title: Option<String>,
    username: Option<String>,
}

fn row_to_subscriber(row: SubscriptionRow) -> DomainResult<Subscriber> {
    let kind = row
        .kind
        .parse::<SubscriptionKind>()
        .map_err(DomainError::SerializationError)?;

    Ok(Subscriber {
        chat_id: row.chat_id,
        kind,
        title: row.title,
        username: row.username,
    })
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn subscribe(&self, subscriber: &Subscriber) -> DomainResult<Option<SubscriptionKind>> {
        let previous = self.get(subscriber.chat_id).await?.map(|s| s.kind);

        sqlx::query(
            r#"INSERT INTO subscriptions (chat_id, kind, title, username, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(chat_id) DO UPDATE SET
                   kind = excluded.kind,
                   title = COALESCE(excluded.title, subscriptions.title),
                   username = COALESCE(excluded.username, subscriptions.username),
                   updated_at = excluded.updated_at"#,
        )
        .bind(subscriber.chat_id)
        .bind(subscriber.kind.as_str())
        .bind(&subscriber.title)
        .bind(&subscriber.username)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::info!(chat_id = subscriber.chat_id, kind = %subscriber.kind, "chat subscribed");
        Ok(previous)
    }

    async fn unsubscribe(&self, chat_id: i64) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(chat_id, "chat unsubscribed");
        }
        Ok(removed)
    }

    async fn get(&self, chat_id: i64) -> DomainResult<Option<Subscriber>> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT chat_id, kind, title, username FROM subscriptions WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_subscriber).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Subscriber>> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            "SELECT chat_id, kind, title, username FROM subscriptions ORDER BY chat_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_subscriber).collect()
    }

    async fn list_by_kind(&self, kind: SubscriptionKind) -> DomainResult<Vec<Subscriber>> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            "SELECT chat_id, kind, title, username FROM subscriptions WHERE kind = ? ORDER BY chat_id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_subscriber).collect()
    }
}
