//! Port for the test-management service that owns launches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::errors::{ApiError, AuthError};
use crate::domain::models::{Defect, LaunchId, LaunchRef, LaunchStatusReport, Statistic, TestResult};

/// Short-lived bearer token. Kept in memory for one cycle and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Read access to launches, their status, statistics, defects and leaf results.
///
/// Every read takes the credential returned by [`LaunchSource::authenticate`];
/// an expired credential surfaces as [`ApiError::Unauthorized`].
#[async_trait]
pub trait LaunchSource: Send + Sync {
    /// Exchange the configured service token for a bearer credential.
    async fn authenticate(&self) -> Result<Credential, AuthError>;

    /// Launches created at or after `window_start` (first page of 100 only).
    async fn search_recent_launches(
        &self,
        credential: &Credential,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<LaunchRef>, ApiError>;

    async fn fetch_status(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<LaunchStatusReport, ApiError>;

    async fn fetch_statistic(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Statistic, ApiError>;

    /// Defects of a launch; empty when upstream reports none.
    async fn fetch_defects(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<Defect>, ApiError>;

    /// Leaf test results of a launch (first page of 100 only).
    async fn fetch_leaf_results(
        &self,
        credential: &Credential,
        launch_id: LaunchId,
    ) -> Result<Vec<TestResult>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("eyJhbGciOi");
        assert!(!format!("{credential:?}").contains("eyJhbGciOi"));
        assert_eq!(credential.bearer(), "Bearer eyJhbGciOi");
    }
}
