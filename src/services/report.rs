//! Text reports sent to subscribers.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::domain::models::{Defect, Report, ReportTotals, ReportConfig, SubscriptionKind, SummaryMap};

/// Message of a report without failed or broken tests. Such reports are not sent.
pub const ALL_PASSED: &str = "All tests have passed";

const ALARM: &str = "\u{1F6A8}";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Characters that must be escaped everywhere in MarkdownV2 text.
const MARKDOWN_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Renders the full and the critical report of a cycle.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    allure_url: String,
    project_id: String,
    critical_percent: f64,
}

impl ReportRenderer {
    pub fn new(allure_url: impl Into<String>, project_id: impl Into<String>, critical_percent: f64) -> Self {
        Self {
            allure_url: allure_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            critical_percent,
        }
    }

    pub fn from_config(allure_url: &str, project_id: &str, report: &ReportConfig) -> Self {
        Self::new(allure_url, project_id, report.critical_percent)
    }

    /// Report for subscribers of every launch.
    pub fn render_full(&self, summaries: &SummaryMap, from: DateTime<Utc>, to: DateTime<Utc>) -> Report {
        self.render(SubscriptionKind::All, summaries, window_header(from, to))
    }

    /// Report for subscribers of critical launches. `critical` is already filtered.
    pub fn render_critical(&self, critical: &SummaryMap, from: DateTime<Utc>, to: DateTime<Utc>) -> Report {
        let header = format!("{} with critical {}%", window_header(from, to), self.critical_percent);
        self.render(SubscriptionKind::Critical, critical, header)
    }

    fn render(&self, audience: SubscriptionKind, summaries: &SummaryMap, header: String) -> Report {
        let mut totals = ReportTotals::default();
        let mut failed_launches = String::new();
        let mut broken_launches = String::new();
        let mut defects: BTreeSet<&Defect> = BTreeSet::new();

        for summary in summaries.values() {
            let link = format!(
                "\\- [{}]({}/launch/{})\n",
                escape_markdown(&summary.name),
                escape_link(&self.allure_url),
                summary.id
            );

            totals.passed += summary.statistic.passed();
            totals.failed += summary.statistic.failed();
            totals.broken += summary.statistic.broken();

            if summary.statistic.failed() > 0 {
                failed_launches.push_str(&link);
            }
            if summary.statistic.broken() > 0 {
                broken_launches.push_str(&link);
            }
            defects.extend(summary.defects.iter());
        }

        let message = if totals.has_failures() {
            let mut message = format!("{ALARM} {} {ALARM}\n", escape_markdown(&header));
            if !failed_launches.is_empty() {
                message.push_str("\nLaunches with FAILED status:\n");
                message.push_str(&failed_launches);
            }
            if !broken_launches.is_empty() {
                message.push_str("\nLaunches with BROKEN status:\n");
                message.push_str(&broken_launches);
            }
            if !defects.is_empty() {
                message.push_str("\nDefects:\n");
                for defect in defects {
                    message.push_str(&format!(
                        "\\- [{}]({}/project/{}/defects/{})\n",
                        escape_markdown(&defect.name),
                        escape_link(&self.allure_url),
                        escape_link(&self.project_id),
                        defect.id
                    ));
                }
            }
            message
        } else {
            ALL_PASSED.to_string()
        };

        Report {
            audience,
            message,
            totals,
            launch_count: summaries.len(),
        }
    }
}

fn window_header(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!(
        "I found unsuccessful launches in the period from {} to {} UTC",
        from.format(TIME_FORMAT),
        to.format(TIME_FORMAT)
    )
}

/// Escape text for Telegram MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside the `(...)` part of a link only `)` and `\` are escaped.
fn escape_link(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}
