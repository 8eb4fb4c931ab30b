/// End-to-end cycle against mocked Allure and Telegram servers with a SQLite store
use allure_notifier::adapters::sqlite::{
    create_migrated_test_pool, SqliteProcessedLaunchRepository, SqliteSubscriptionRepository,
};
use allure_notifier::domain::models::{LaunchId, Subscriber, SubscriptionKind, TelegramConfig};
use allure_notifier::domain::ports::SubscriptionRepository;
use allure_notifier::infrastructure::allure::{AllureClient, AllureClientConfig, TransportRetry};
use allure_notifier::infrastructure::telegram::TelegramTransport;
use allure_notifier::services::{
    CollectionService, CollectorConfig, DedupService, NotificationDispatcher, NotifierService,
    PollPolicy, ReportRenderer,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

async fn json_mock(server: &mut ServerGuard, method: &str, path: &str, body: &str) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_allure(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        json_mock(server, "POST", "/api/uaa/oauth/token", r#"{"access_token":"bearer-abc"}"#).await,
        json_mock(
            server,
            "GET",
            "/api/rs/launch",
            r#"{"content":[
                {"id":1,"name":"Smoke"},
                {"id":2,"name":"Green"},
                {"id":3,"name":"Infra"}
            ]}"#,
        )
        .await,
        json_mock(server, "GET", "/api/rs/launch/1/job", r#"[{"stage":"finished"}]"#).await,
        json_mock(server, "GET", "/api/rs/launch/2/job", r#"[{"stage":"finished"}]"#).await,
        json_mock(
            server,
            "GET",
            "/api/rs/launch/3/job",
            r#"[{"stage":"run_failure","errorMessage":"agent lost"}]"#,
        )
        .await,
        json_mock(
            server,
            "GET",
            "/api/rs/launch/1/statistic",
            r#"[{"status":"passed","count":8},{"status":"failed","count":2}]"#,
        )
        .await,
        json_mock(
            server,
            "GET",
            "/api/rs/launch/2/statistic",
            r#"[{"status":"passed","count":5}]"#,
        )
        .await,
        json_mock(
            server,
            "GET",
            "/api/rs/launch/1/defect",
            r#"{"content":[{"id":5,"name":"Login timeout"}]}"#,
        )
        .await,
        json_mock(server, "GET", "/api/rs/launch/2/defect", r#"{"content":[]}"#).await,
        json_mock(server, "GET", "/api/rs/testresulttree/leaf", r#"{"content":[]}"#).await,
    ]
}

async fn notifier(allure: &ServerGuard, telegram: &ServerGuard) -> (NotifierService, Arc<SqliteSubscriptionRepository>) {
    let pool = create_migrated_test_pool().await.expect("Failed to create pool");
    let subscriptions = Arc::new(SqliteSubscriptionRepository::new(pool.clone()));
    let dedup = Arc::new(DedupService::new(
        Arc::new(SqliteProcessedLaunchRepository::new(pool)),
        true,
    ));

    let client = AllureClient::new(AllureClientConfig {
        base_url: allure.url(),
        project_id: "7".to_string(),
        token: "user-token".to_string(),
        timeout_secs: 5,
        retry: TransportRetry::immediate(2),
    })
    .expect("Failed to create client");

    let collector = CollectionService::new(
        Arc::new(client),
        dedup.clone(),
        PollPolicy::new(2, Duration::ZERO),
        2,
        CollectorConfig {
            window: chrono::TimeDelta::minutes(200),
            critical_percent: 50.0,
            cycle_timeout: Some(Duration::from_secs(30)),
        },
    );

    let transport = TelegramTransport::new(&TelegramConfig {
        bot_token: "123:abc".to_string(),
        api_url: telegram.url(),
    })
    .expect("Failed to create transport");

    let dispatcher = NotificationDispatcher::new(
        subscriptions.clone(),
        Arc::new(transport),
        ReportRenderer::new(allure.url(), "7", 50.0),
    );

    (NotifierService::new(collector, dispatcher, dedup), subscriptions)
}

#[tokio::test]
async fn test_cycle_reports_each_launch_once() {
    let mut allure = Server::new_async().await;
    let mut telegram = Server::new_async().await;
    let _allure_mocks = mock_allure(&mut allure).await;

    let send = telegram
        .mock("POST", "/bot123:abc/sendMessage")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(serde_json::json!({"chat_id": 100, "parse_mode": "MarkdownV2"})),
            Matcher::Regex(r"\[Smoke\]".to_string()),
            Matcher::Regex(r"Login timeout".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;

    let (notifier, subscriptions) = notifier(&allure, &telegram).await;
    subscriptions
        .subscribe(&Subscriber::new(100, SubscriptionKind::All))
        .await
        .unwrap();

    let first = notifier.run_cycle().await.expect("first cycle failed");
    assert_eq!(first.outcome.discovered, 3);
    assert_eq!(first.outcome.summaries.len(), 2);
    assert!(first.outcome.critical.is_empty());
    assert_eq!(first.outcome.run_failures, vec![LaunchId(3)]);
    assert_eq!(first.dispatch.full_sent, 1);
    assert_eq!(first.dispatch.critical_sent, 0);
    assert_eq!(first.marked, 2);

    let second = notifier.run_cycle().await.expect("second cycle failed");
    assert!(second.outcome.summaries.is_empty());
    assert_eq!(second.outcome.already_processed.len(), 2);
    assert_eq!(second.dispatch.delivered(), 0);
    assert_eq!(second.marked, 0);

    send.assert_async().await;
}

#[tokio::test]
async fn test_blocked_chat_is_unsubscribed() {
    let mut allure = Server::new_async().await;
    let mut telegram = Server::new_async().await;
    let _allure_mocks = mock_allure(&mut allure).await;

    let _send = telegram
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(403)
        .with_body(r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#)
        .create_async()
        .await;

    let (notifier, subscriptions) = notifier(&allure, &telegram).await;
    subscriptions
        .subscribe(&Subscriber::new(100, SubscriptionKind::All))
        .await
        .unwrap();

    let report = notifier.run_cycle().await.expect("cycle failed");

    assert_eq!(report.dispatch.unsubscribed, vec![100]);
    assert_eq!(report.dispatch.delivered(), 0);
    assert!(subscriptions.get(100).await.unwrap().is_none());
    assert_eq!(report.marked, 2);
}

#[tokio::test]
async fn test_rejected_token_fails_cycle() {
    let mut allure = Server::new_async().await;
    let telegram = Server::new_async().await;
    let _token = allure
        .mock("POST", "/api/uaa/oauth/token")
        .with_status(401)
        .create_async()
        .await;

    let (notifier, _) = notifier(&allure, &telegram).await;
    let err = notifier.run_cycle().await.unwrap_err();

    assert!(err.to_string().contains("Authentication failed"));
    assert!(notifier.dedup().processed_ids().await.unwrap().is_empty());
}
