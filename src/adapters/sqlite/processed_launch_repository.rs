//! SQLite implementation of the ProcessedLaunchRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

use crate::domain::errors::DomainResult;
use crate::domain::models::LaunchId;
use crate::domain::ports::ProcessedLaunchRepository;

/// Stores reported launch ids in the `launch_data` table.
#[derive(Clone)]
pub struct SqliteProcessedLaunchRepository {
    pool: SqlitePool,
}

impl SqliteProcessedLaunchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedLaunchRepository for SqliteProcessedLaunchRepository {
    async fn list_ids(&self) -> DomainResult<BTreeSet<LaunchId>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT launch_id FROM launch_data")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| LaunchId(id)).collect())
    }

    async fn upsert_many(&self, ids: &[LaunchId]) -> DomainResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let processed_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query(
                "INSERT INTO launch_data (launch_id, processed_at) VALUES (?, ?)
                 ON CONFLICT(launch_id) DO NOTHING",
            )
            .bind(id.get())
            .bind(&processed_at)
            .execute(&mut *tx)
            .await?;
            tracing::debug!(launch_id = %id, "launch added to launch_data");
        }
        tx.commit().await?;

        Ok(())
    }

    async fn clear(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM launch_data")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
