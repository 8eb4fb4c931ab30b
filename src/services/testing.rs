//! Scripted in-memory ports shared by the service unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::errors::{ApiError, AuthError, DeliveryError, DomainResult};
use crate::domain::models::{
    Defect, LaunchId, LaunchRef, LaunchStatus, LaunchStatusReport, Report, Statistic, Subscriber,
    SubscriptionKind, TestResult,
};
use crate::domain::ports::{
    Credential, LaunchSource, MessageTransport, ProcessedLaunchRepository, SubscriptionRepository,
};
use crate::services::collector::{CollectionService, CollectorConfig};
use crate::services::dedup::DedupService;
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::notifier::NotifierService;
use crate::services::poll_policy::PollPolicy;
use crate::services::report::ReportRenderer;

/// Launch source replaying a fixed stage sequence per launch. The last stage repeats.
#[derive(Default)]
pub struct FakeSource {
    launches: Vec<LaunchRef>,
    stages: HashMap<LaunchId, Vec<&'static str>>,
    statistics: HashMap<LaunchId, Statistic>,
    defects: HashMap<LaunchId, Vec<Defect>>,
    failing_statistic: HashSet<LaunchId>,
    failing_status: HashSet<LaunchId>,
    unauthorized_status: HashSet<LaunchId>,
    reject_auth: bool,
    status_calls: Mutex<HashMap<LaunchId, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_launch(mut self, id: i64, name: &str, stages: &[&'static str]) -> Self {
        let id = LaunchId(id);
        self.launches.push(LaunchRef::discovered(id, name));
        self.stages.insert(id, stages.to_vec());
        self
    }

    pub fn with_statistic(mut self, id: i64, statistic: Statistic) -> Self {
        self.statistics.insert(LaunchId(id), statistic);
        self
    }

    pub fn with_defects(mut self, id: i64, defects: Vec<Defect>) -> Self {
        self.defects.insert(LaunchId(id), defects);
        self
    }

    pub fn failing_statistic(mut self, id: i64) -> Self {
        self.failing_statistic.insert(LaunchId(id));
        self
    }

    pub fn failing_status(mut self, id: i64) -> Self {
        self.failing_status.insert(LaunchId(id));
        self
    }

    pub fn unauthorized_status(mut self, id: i64) -> Self {
        self.unauthorized_status.insert(LaunchId(id));
        self
    }

    pub fn rejecting_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }

    pub fn status_calls(&self, id: i64) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .get(&LaunchId(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn launch(&self, id: i64) -> LaunchRef {
        self.launches
            .iter()
            .find(|l| l.id == LaunchId(id))
            .cloned()
            .unwrap()
    }
}

fn transient(endpoint: &str) -> ApiError {
    ApiError::Transient {
        endpoint: endpoint.to_string(),
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl LaunchSource for FakeSource {
    async fn authenticate(&self) -> Result<Credential, AuthError> {
        if self.reject_auth {
            return Err(AuthError::Rejected {
                status: 400,
                body: "invalid token".to_string(),
            });
        }
        Ok(Credential::new("test-token"))
    }

    async fn search_recent_launches(
        &self,
        _credential: &Credential,
        _window_start: DateTime<Utc>,
    ) -> Result<Vec<LaunchRef>, ApiError> {
        Ok(self.launches.clone())
    }

    async fn fetch_status(
        &self,
        _credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<LaunchStatusReport, ApiError> {
        if self.unauthorized_status.contains(&launch_id) {
            return Err(ApiError::Unauthorized {
                endpoint: format!("/api/rs/launch/{launch_id}/job"),
            });
        }
        if self.failing_status.contains(&launch_id) {
            return Err(transient(&format!("/api/rs/launch/{launch_id}/job")));
        }

        let call = {
            let mut calls = self.status_calls.lock().unwrap();
            let entry = calls.entry(launch_id).or_insert(0);
            *entry += 1;
            *entry - 1
        };

        let stages = self.stages.get(&launch_id).cloned().unwrap_or_default();
        let stage = stages
            .get(call)
            .or_else(|| stages.last())
            .copied()
            .unwrap_or("running");

        Ok(LaunchStatusReport {
            status: LaunchStatus::from_stage(stage),
            error_message: None,
        })
    }

    async fn fetch_statistic(
        &self,
        _credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Statistic, ApiError> {
        if self.failing_statistic.contains(&launch_id) {
            return Err(transient(&format!("/api/rs/launch/{launch_id}/statistic")));
        }
        Ok(self.statistics.get(&launch_id).cloned().unwrap_or_default())
    }

    async fn fetch_defects(
        &self,
        _credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<Defect>, ApiError> {
        Ok(self.defects.get(&launch_id).cloned().unwrap_or_default())
    }

    async fn fetch_leaf_results(
        &self,
        _credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<TestResult>, ApiError> {
        Ok(vec![TestResult {
            test_case_id: Some(launch_id.get() * 10),
            test_case_launch_id: launch_id.get() * 100,
            name: format!("case of {launch_id}"),
            status: Some("passed".to_string()),
        }])
    }
}

/// Processed launch store kept in memory, counting how often it is touched.
#[derive(Default)]
pub struct MemoryProcessedStore {
    ids: Mutex<BTreeSet<LaunchId>>,
    reads: Mutex<usize>,
    writes: Mutex<usize>,
}

impl MemoryProcessedStore {
    pub fn with_ids(ids: &[i64]) -> Self {
        let store = Self::default();
        store.ids.lock().unwrap().extend(ids.iter().map(|id| LaunchId(*id)));
        store
    }

    pub fn ids(&self) -> BTreeSet<LaunchId> {
        self.ids.lock().unwrap().clone()
    }

    pub fn touches(&self) -> usize {
        *self.reads.lock().unwrap() + *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ProcessedLaunchRepository for MemoryProcessedStore {
    async fn list_ids(&self) -> DomainResult<BTreeSet<LaunchId>> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.ids())
    }

    async fn upsert_many(&self, ids: &[LaunchId]) -> DomainResult<()> {
        *self.writes.lock().unwrap() += 1;
        self.ids.lock().unwrap().extend(ids.iter().copied());
        Ok(())
    }

    async fn clear(&self) -> DomainResult<u64> {
        *self.writes.lock().unwrap() += 1;
        let mut ids = self.ids.lock().unwrap();
        let cleared = ids.len() as u64;
        ids.clear();
        Ok(cleared)
    }
}

/// Subscription store kept in memory.
#[derive(Default)]
pub struct MemorySubscriptions {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemorySubscriptions {
    pub fn with(subscribers: &[(i64, SubscriptionKind)]) -> Self {
        let store = Self::default();
        store.subscribers.lock().unwrap().extend(
            subscribers
                .iter()
                .map(|(chat_id, kind)| Subscriber::new(*chat_id, *kind)),
        );
        store
    }

    pub fn chat_ids(&self) -> Vec<i64> {
        self.subscribers.lock().unwrap().iter().map(|s| s.chat_id).collect()
    }
}

#[async_trait]
impl SubscriptionRepository for MemorySubscriptions {
    async fn subscribe(&self, subscriber: &Subscriber) -> DomainResult<Option<SubscriptionKind>> {
        let mut subscribers = self.subscribers.lock().unwrap();
        let previous = subscribers
            .iter()
            .position(|s| s.chat_id == subscriber.chat_id)
            .map(|i| subscribers.remove(i).kind);
        subscribers.push(subscriber.clone());
        Ok(previous)
    }

    async fn unsubscribe(&self, chat_id: i64) -> DomainResult<bool> {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|s| s.chat_id != chat_id);
        Ok(subscribers.len() != before)
    }

    async fn get(&self, chat_id: i64) -> DomainResult<Option<Subscriber>> {
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.chat_id == chat_id)
            .cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Subscriber>> {
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn list_by_kind(&self, kind: SubscriptionKind) -> DomainResult<Vec<Subscriber>> {
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect())
    }
}

/// Transport recording every delivery. Chats listed as revoked or broken fail.
#[derive(Default)]
pub struct RecordingTransport {
    revoked: HashSet<i64>,
    broken: HashSet<i64>,
    sent: Mutex<Vec<(i64, Report)>>,
}

impl RecordingTransport {
    pub fn revoking(mut self, chat_id: i64) -> Self {
        self.revoked.insert(chat_id);
        self
    }

    pub fn breaking(mut self, chat_id: i64) -> Self {
        self.broken.insert(chat_id);
        self
    }

    pub fn sent(&self) -> Vec<(i64, Report)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_report(&self, chat_id: i64, report: &Report) -> Result<(), DeliveryError> {
        if self.revoked.contains(&chat_id) {
            return Err(DeliveryError::Revoked {
                chat_id,
                reason: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        if self.broken.contains(&chat_id) {
            return Err(DeliveryError::Rejected {
                chat_id,
                status: 400,
                body: "Bad Request: can't parse entities".to_string(),
            });
        }
        self.sent.lock().unwrap().push((chat_id, report.clone()));
        Ok(())
    }
}

/// Notifier over the fakes with dedup enabled and one `all` subscriber (chat 100).
pub fn notifier(
    source: FakeSource,
    store: Arc<MemoryProcessedStore>,
    transport: Arc<RecordingTransport>,
) -> NotifierService {
    let dedup = Arc::new(DedupService::new(store, true));
    let collector = CollectionService::new(
        Arc::new(source),
        dedup.clone(),
        PollPolicy::new(2, Duration::ZERO),
        1,
        CollectorConfig {
            window: chrono::TimeDelta::minutes(200),
            critical_percent: 50.0,
            cycle_timeout: Some(Duration::from_secs(30)),
        },
    );
    let dispatcher = NotificationDispatcher::new(
        Arc::new(MemorySubscriptions::with(&[(100, SubscriptionKind::All)])),
        transport,
        ReportRenderer::new("https://allure.example.com", "7", 50.0),
    );
    NotifierService::new(collector, dispatcher, dedup)
}
