//! SQLite database adapters for the notifier.

pub mod connection;
pub mod migrations;
pub mod processed_launch_repository;
pub mod subscription_repository;

pub use connection::{create_pool, create_test_pool, ping, ConnectionError, PoolConfig};
pub use migrations::{Migration, MigrationError, Migrator, MIGRATIONS};
pub use processed_launch_repository::SqliteProcessedLaunchRepository;
pub use subscription_repository::SqliteSubscriptionRepository;

use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open the database at `database_url` and bring its schema up to date.
pub async fn initialize_database(database_url: &str, config: &PoolConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    Migrator::new(pool.clone()).migrate(MIGRATIONS).await?;
    Ok(pool)
}

/// Database URL for a filesystem path.
pub fn database_url(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{path}")
    }
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    Migrator::new(pool.clone()).migrate(MIGRATIONS).await?;
    Ok(pool)
}
