//! Wire types of the Allure TestOps REST API.
//!
//! Only the fields the notifier reads are declared; everything else in the
//! upstream payloads is ignored during deserialization.

use serde::Deserialize;

use crate::domain::models::{Defect, LaunchId, LaunchRef, LaunchStatus, LaunchStatusReport, Statistic, TestResult};

/// Response of `POST /api/uaa/oauth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Paged list wrapper used by search endpoints.
///
/// Allure sends `"content": null` for some empty pages.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub content: Option<Vec<T>>,
}

impl<T> Page<T> {
    /// Page elements; absent or `null` content is an empty page.
    pub fn into_content(self) -> Vec<T> {
        self.content.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct LaunchDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl From<LaunchDto> for LaunchRef {
    fn from(dto: LaunchDto) -> Self {
        Self::discovered(LaunchId(dto.id), dto.name)
    }
}

/// One element of the `/launch/{id}/job` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchJobDto {
    pub stage: Option<String>,
    pub error_message: Option<String>,
}

impl LaunchJobDto {
    /// Only element 0 of the job array carries the launch stage.
    pub fn into_status_report(jobs: Vec<Self>) -> LaunchStatusReport {
        jobs.into_iter()
            .next()
            .map_or_else(LaunchStatusReport::pending, |job| LaunchStatusReport {
                status: job
                    .stage
                    .as_deref()
                    .map_or(LaunchStatus::Pending, LaunchStatus::from_stage),
                error_message: job.error_message,
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatisticEntryDto {
    pub status: String,
    #[serde(default)]
    pub count: u64,
}

impl StatisticEntryDto {
    pub fn into_statistic(entries: Vec<Self>) -> Statistic {
        let mut statistic = Statistic::new();
        for entry in entries {
            statistic.record(entry.status, entry.count);
        }
        statistic
    }
}

/// Upstream defects also carry `closed` and `count`; they are not part of the summary.
#[derive(Debug, Deserialize)]
pub struct DefectDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl From<DefectDto> for Defect {
    fn from(dto: DefectDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafDto {
    pub id: i64,
    pub test_case_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub status: Option<String>,
}

impl From<LeafDto> for TestResult {
    fn from(dto: LeafDto) -> Self {
        Self {
            test_case_id: dto.test_case_id,
            test_case_launch_id: dto.id,
            name: dto.name,
            status: dto.status,
        }
    }
}
