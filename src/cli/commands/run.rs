//! Implementation of the `allure-notifier run` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::services::{CollectionDaemon, DaemonConfig, DaemonEvent};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Wait one interval before the first cycle
    #[arg(long)]
    pub no_startup_cycle: bool,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub total_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub reports_delivered: u64,
    pub resets: u64,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!(
            "Stopped after {} cycle(s): {} succeeded, {} failed, {} report(s) delivered, {} reset(s)",
            self.total_cycles,
            self.successful_cycles,
            self.failed_cycles,
            self.reports_delivered,
            self.resets
        )
    }
}

fn log_event(event: &DaemonEvent) {
    match event {
        DaemonEvent::Started => info!("collection daemon started"),
        DaemonEvent::CycleStarted { run_number } => info!(run_number, "cycle started"),
        DaemonEvent::CycleCompleted {
            run_number,
            new_launches,
            delivered,
            duration_ms,
        } => info!(run_number, new_launches, delivered, duration_ms, "cycle completed"),
        DaemonEvent::CycleFailed { run_number, error } => {
            error!(run_number, %error, "cycle failed");
        }
        DaemonEvent::StoreReset { cleared } => info!(cleared, "daily reset done"),
        DaemonEvent::StoreResetFailed { error } => warn!(%error, "daily reset failed"),
        DaemonEvent::Stopped { reason } => info!(?reason, "collection daemon stopped"),
    }
}

pub async fn execute(args: RunArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let notifier = Arc::new(ctx.notifier()?);

    let mut config = DaemonConfig::from_config(&ctx.config);
    config.run_on_startup = !args.no_startup_cycle;
    info!(
        interval_secs = config.cycle_interval.as_secs(),
        reset_hour_utc = ?config.reset_hour_utc,
        "starting collection daemon"
    );

    let daemon = CollectionDaemon::new(notifier, config);
    let handle = daemon.handle();
    let mut events = daemon.run();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event @ DaemonEvent::Stopped { .. }) => {
                    log_event(&event);
                    break;
                }
                Some(event) => log_event(&event),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !handle.is_stop_requested() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl-C, stopping");
                }
                info!("shutdown requested, finishing current cycle");
                handle.stop();
            }
        }
    }

    let status = handle.status().await;
    output(
        &RunOutput {
            total_cycles: status.total_cycles,
            successful_cycles: status.successful_cycles,
            failed_cycles: status.failed_cycles,
            reports_delivered: status.reports_delivered,
            resets: status.resets,
        },
        json_mode,
    );
    Ok(())
}
