//! Implementation of the `allure-notifier collect` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{CycleOutcome, DispatchReport, LaunchId, LaunchSummary};

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Only collect and print; send nothing and mark nothing as processed
    #[arg(long)]
    pub no_dispatch: bool,
}

#[derive(Debug, Serialize)]
pub struct LaunchRow {
    pub id: LaunchId,
    pub name: String,
    pub passed: u64,
    pub failed: u64,
    pub broken: u64,
    pub failure_rate: Option<f64>,
    pub critical: bool,
    pub defects: usize,
}

impl LaunchRow {
    fn new(summary: &LaunchSummary, critical: bool) -> Self {
        Self {
            id: summary.id,
            name: summary.name.clone(),
            passed: summary.statistic.passed(),
            failed: summary.statistic.failed(),
            broken: summary.statistic.broken(),
            failure_rate: summary.statistic.failure_rate(),
            critical,
            defects: summary.defects.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectOutput {
    pub outcome: CycleOutcome,
    pub launches: Vec<LaunchRow>,
    pub dispatch: Option<DispatchReport>,
    pub marked: usize,
}

impl CollectOutput {
    fn new(outcome: CycleOutcome, dispatch: Option<DispatchReport>, marked: usize) -> Self {
        let launches = outcome
            .summaries
            .values()
            .map(|summary| LaunchRow::new(summary, outcome.critical.contains_key(&summary.id)))
            .collect();
        Self {
            outcome,
            launches,
            dispatch,
            marked,
        }
    }
}

fn join_ids(ids: &[LaunchId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl CommandOutput for CollectOutput {
    fn to_human(&self) -> String {
        let outcome = &self.outcome;
        let mut lines = vec![format!(
            "Cycle {}: {} launch(es) found between {} and {}",
            outcome.cycle_id,
            outcome.discovered,
            outcome.window_start.format("%Y-%m-%d %H:%M:%S"),
            outcome.window_end.format("%Y-%m-%d %H:%M:%S"),
        )];

        if self.launches.is_empty() {
            lines.push("No new finished launches.".to_string());
        } else {
            let mut table = list_table(&["id", "name", "passed", "failed", "broken", "fail %", "critical"]);
            for row in &self.launches {
                table.add_row(vec![
                    row.id.to_string(),
                    truncate(&row.name, 40),
                    row.passed.to_string(),
                    row.failed.to_string(),
                    row.broken.to_string(),
                    row.failure_rate.map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
                    if row.critical { "yes" } else { "" }.to_string(),
                ]);
            }
            lines.push(table.to_string());
        }

        if !outcome.timed_out.is_empty() {
            lines.push(format!("Still running: {}", join_ids(&outcome.timed_out)));
        }
        if !outcome.run_failures.is_empty() {
            lines.push(format!("Run failures (not reported): {}", join_ids(&outcome.run_failures)));
        }
        if !outcome.already_processed.is_empty() {
            lines.push(format!("Already reported: {}", join_ids(&outcome.already_processed)));
        }
        for failure in &outcome.failures {
            lines.push(format!(
                "Launch {} skipped during {}: {}",
                failure.launch_id, failure.stage, failure.error
            ));
        }

        match &self.dispatch {
            Some(dispatch) => {
                lines.push(format!(
                    "Sent {} full and {} critical report(s); {} launch(es) marked as processed",
                    dispatch.full_sent, dispatch.critical_sent, self.marked
                ));
                if !dispatch.unsubscribed.is_empty() {
                    lines.push(format!("Unsubscribed revoked chats: {:?}", dispatch.unsubscribed));
                }
                if !dispatch.failed.is_empty() {
                    lines.push(format!("Delivery failed for chats: {:?}", dispatch.failed));
                }
            }
            None => lines.push("Dispatch skipped.".to_string()),
        }

        lines.join("\n")
    }
}

pub async fn execute(args: CollectArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let notifier = ctx.notifier()?;

    let output_data = if args.no_dispatch {
        let outcome = notifier.collect_only().await.context("Collection cycle failed")?;
        CollectOutput::new(outcome, None, 0)
    } else {
        let report = notifier.run_cycle().await.context("Notification cycle failed")?;
        CollectOutput::new(report.outcome, Some(report.dispatch), report.marked)
    };

    output(&output_data, json_mode);
    Ok(())
}
