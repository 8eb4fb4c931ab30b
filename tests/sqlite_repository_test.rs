/// Integration tests for the SQLite stores
use allure_notifier::adapters::sqlite::{
    create_migrated_test_pool, database_url, initialize_database, PoolConfig, SqliteProcessedLaunchRepository,
    SqliteSubscriptionRepository,
};
use allure_notifier::domain::models::{LaunchId, Subscriber, SubscriptionKind};
use allure_notifier::domain::ports::{ProcessedLaunchRepository, SubscriptionRepository};
use tempfile::TempDir;

#[tokio::test]
async fn test_processed_ids_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("state").join("notifier.db");
    let url = database_url(path.to_str().expect("utf-8 path"));

    {
        let pool = initialize_database(&url, &PoolConfig::default()).await.expect("Failed to open database");
        let repo = SqliteProcessedLaunchRepository::new(pool.clone());
        repo.upsert_many(&[LaunchId(3), LaunchId(1), LaunchId(2)])
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = initialize_database(&url, &PoolConfig::default()).await.expect("Failed to reopen database");
    let repo = SqliteProcessedLaunchRepository::new(pool);
    let ids: Vec<LaunchId> = repo.list_ids().await.unwrap().into_iter().collect();
    assert_eq!(ids, vec![LaunchId(1), LaunchId(2), LaunchId(3)]);
}

#[tokio::test]
async fn test_upsert_is_idempotent_and_clear_counts() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteProcessedLaunchRepository::new(pool);

    repo.upsert_many(&[LaunchId(10), LaunchId(11)]).await.unwrap();
    repo.upsert_many(&[LaunchId(11), LaunchId(12)]).await.unwrap();
    assert_eq!(repo.list_ids().await.unwrap().len(), 3);

    assert_eq!(repo.clear().await.unwrap(), 3);
    assert!(repo.list_ids().await.unwrap().is_empty());
    assert_eq!(repo.clear().await.unwrap(), 0);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteSubscriptionRepository::new(pool);

    let group = Subscriber {
        title: Some("QA team".to_string()),
        ..Subscriber::new(-1_001_234, SubscriptionKind::Critical)
    };
    let person = Subscriber {
        username: Some("tester".to_string()),
        ..Subscriber::new(55, SubscriptionKind::All)
    };

    assert_eq!(repo.subscribe(&group).await.unwrap(), None);
    assert_eq!(repo.subscribe(&person).await.unwrap(), None);

    let critical = repo.list_by_kind(SubscriptionKind::Critical).await.unwrap();
    assert_eq!(critical, vec![group.clone()]);

    let switched = Subscriber::new(55, SubscriptionKind::Critical);
    assert_eq!(
        repo.subscribe(&switched).await.unwrap(),
        Some(SubscriptionKind::All)
    );
    assert!(repo.list_by_kind(SubscriptionKind::All).await.unwrap().is_empty());
    assert_eq!(repo.list().await.unwrap().len(), 2);

    assert!(repo.unsubscribe(-1_001_234).await.unwrap());
    assert!(!repo.unsubscribe(-1_001_234).await.unwrap());
    assert!(repo.get(-1_001_234).await.unwrap().is_none());
}
