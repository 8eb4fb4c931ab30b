//! Allure TestOps HTTP API client implementation

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::query::{encode_search, SearchFilter};
use super::retry::TransportRetry;
use super::types::{DefectDto, LaunchDto, LaunchJobDto, LeafDto, Page, StatisticEntryDto, TokenResponse};
use crate::domain::errors::{ApiError, AuthError};
use crate::domain::models::{AllureConfig, Defect, LaunchId, LaunchRef, LaunchStatusReport, Statistic, TestResult};
use crate::domain::ports::{Credential, LaunchSource};

/// Page size of the search endpoints. Only the first page is read.
pub const PAGE_SIZE: u32 = 100;

const TOKEN_ENDPOINT: &str = "/api/uaa/oauth/token";
const LAUNCH_ENDPOINT: &str = "/api/rs/launch";
const LEAF_ENDPOINT: &str = "/api/rs/testresulttree/leaf";

/// Configuration for the Allure HTTP client
#[derive(Clone)]
pub struct AllureClientConfig {
    /// Base URL of the Allure TestOps instance
    pub base_url: String,

    /// Project whose launches are searched
    pub project_id: String,

    /// User API token
    pub token: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry policy for retryable statuses
    pub retry: TransportRetry,
}

impl From<&AllureConfig> for AllureClientConfig {
    fn from(config: &AllureConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            project_id: config.project_id.clone(),
            token: config.token.clone(),
            timeout_secs: config.timeout_secs,
            retry: TransportRetry::new(
                config.max_attempts,
                Duration::from_millis(500),
                Duration::from_secs(5),
            ),
        }
    }
}

/// HTTP client for Allure TestOps
///
/// Holds no credential of its own: callers authenticate once per cycle and pass
/// the resulting [`Credential`] to every read.
pub struct AllureClient {
    http_client: ReqwestClient,
    base_url: String,
    project_id: String,
    token: String,
    retry: TransportRetry,
}

impl AllureClient {
    /// Build the HTTP client. No request is made until the first call.
    pub fn new(config: AllureClientConfig) -> anyhow::Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            token: config.token,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` and decode the JSON body, retrying retryable statuses.
    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.retry
            .execute(|| self.get_once(credential, endpoint, query))
            .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, endpoint))
            .header(header::AUTHORIZATION, credential.bearer())
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Network {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "GET");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(endpoint, status, body));
        }

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

/// Map a non-200 status to the error taxonomy.
pub fn classify_status(endpoint: &str, status: StatusCode, body: String) -> ApiError {
    let endpoint = endpoint.to_string();
    match status.as_u16() {
        401 => ApiError::Unauthorized { endpoint },
        code @ 400..=504 => ApiError::Transient {
            endpoint,
            status: code,
            body,
        },
        code => ApiError::Unexpected {
            endpoint,
            status: code,
            body,
        },
    }
}

#[async_trait]
impl LaunchSource for AllureClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn authenticate(&self) -> Result<Credential, AuthError> {
        let form = [
            ("token", self.token.as_str()),
            ("grant_type", "apitoken"),
            ("scope", "openid"),
        ];

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, TOKEN_ENDPOINT))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        debug!("bearer token obtained");
        Ok(Credential::new(token.access_token))
    }

    #[instrument(skip(self, credential))]
    async fn search_recent_launches(
        &self,
        credential: &Credential,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<LaunchRef>, ApiError> {
        let search = encode_search(&[SearchFilter::created_after(window_start)]).map_err(|e| {
            ApiError::Decode {
                endpoint: LAUNCH_ENDPOINT.to_string(),
                message: e.to_string(),
            }
        })?;

        let query = [
            ("projectId", self.project_id.clone()),
            ("page", "0".to_string()),
            ("preview", "true".to_string()),
            ("search", search),
            ("size", PAGE_SIZE.to_string()),
        ];

        let page: Page<LaunchDto> = self.get_json(credential, LAUNCH_ENDPOINT, &query).await?;
        Ok(page.into_content().into_iter().map(LaunchRef::from).collect())
    }

    async fn fetch_status(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<LaunchStatusReport, ApiError> {
        let endpoint = format!("{LAUNCH_ENDPOINT}/{launch_id}/job");
        let jobs: Vec<LaunchJobDto> = self.get_json(credential, &endpoint, &[]).await?;
        Ok(LaunchJobDto::into_status_report(jobs))
    }

    async fn fetch_statistic(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Statistic, ApiError> {
        let endpoint = format!("{LAUNCH_ENDPOINT}/{launch_id}/statistic");
        let entries: Option<Vec<StatisticEntryDto>> =
            self.get_json(credential, &endpoint, &[]).await?;
        Ok(StatisticEntryDto::into_statistic(entries.unwrap_or_default()))
    }

    async fn fetch_defects(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<Defect>, ApiError> {
        let endpoint = format!("{LAUNCH_ENDPOINT}/{launch_id}/defect");
        let page: Page<DefectDto> = self.get_json(credential, &endpoint, &[]).await?;
        Ok(page.into_content().into_iter().map(Defect::from).collect())
    }

    async fn fetch_leaf_results(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<TestResult>, ApiError> {
        let query = [
            ("launchId", launch_id.to_string()),
            ("size", PAGE_SIZE.to_string()),
        ];
        let page: Page<LeafDto> = self.get_json(credential, LEAF_ENDPOINT, &query).await?;
        Ok(page.into_content().into_iter().map(TestResult::from).collect())
    }
}
