//! Collection daemon.
//!
//! Runs scheduled work for the notifier:
//! - A notification cycle every `cycle_interval`, skipping ticks missed while busy
//! - A daily reset of the processed launch store

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use super::notifier::NotifierService;
use crate::domain::models::Config;

/// Configuration for the collection daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Interval between notification cycles.
    pub cycle_interval: Duration,
    /// Whether the first cycle runs right away.
    pub run_on_startup: bool,
    /// UTC hour of the daily processed store reset, if enabled.
    pub reset_hour_utc: Option<u32>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(20),
            run_on_startup: true,
            reset_hour_utc: Some(20),
        }
    }
}

impl DaemonConfig {
    /// Create config with custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            cycle_interval: interval,
            ..Default::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let reset_enabled = config.dedup.enabled && config.dedup.reset_enabled;
        Self {
            cycle_interval: Duration::from_secs(config.report.interval_secs),
            run_on_startup: true,
            reset_hour_utc: reset_enabled.then_some(config.dedup.reset_hour_utc),
        }
    }
}

/// Event emitted by the collection daemon.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    Started,
    CycleStarted { run_number: u64 },
    CycleCompleted {
        run_number: u64,
        new_launches: usize,
        delivered: usize,
        duration_ms: u64,
    },
    CycleFailed { run_number: u64, error: String },
    StoreReset { cleared: u64 },
    StoreResetFailed { error: String },
    Stopped { reason: StopReason },
}

/// Reason the daemon stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Requested,
}

/// Status of the collection daemon.
#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    pub running: bool,
    pub total_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub consecutive_failures: u32,
    pub reports_delivered: u64,
    pub resets: u64,
    pub last_cycle: Option<Instant>,
    pub next_reset: Option<DateTime<Utc>>,
}

/// Handle to control the daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request the daemon to stop. A running cycle finishes first.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

pub struct CollectionDaemon {
    notifier: Arc<NotifierService>,
    config: DaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl CollectionDaemon {
    pub fn new(notifier: Arc<NotifierService>, config: DaemonConfig) -> Self {
        Self {
            notifier,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
            status: self.status.clone(),
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Run the daemon on its own task, returning a channel for events.
    pub fn run(self) -> mpsc::Receiver<DaemonEvent> {
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            self.run_loop(tx).await;
        });

        rx
    }

    async fn run_loop(self, tx: mpsc::Sender<DaemonEvent>) {
        self.status.write().await.running = true;
        let _ = tx.send(DaemonEvent::Started).await;

        let mut ticker = interval(self.config.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.config.run_on_startup {
            ticker.tick().await;
        }

        let mut next_reset = self
            .config
            .reset_hour_utc
            .and_then(|hour| next_reset_after(Utc::now(), hour));
        self.status.write().await.next_reset = next_reset;

        while !self.stop_flag.load(Ordering::Acquire) {
            let until_reset = next_reset
                .map(|at| (at - Utc::now()).to_std().unwrap_or_default())
                .unwrap_or_default();

            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle(&tx).await;
                }
                () = tokio::time::sleep(until_reset), if next_reset.is_some() => {
                    self.run_reset(&tx).await;
                    next_reset = self
                        .config
                        .reset_hour_utc
                        .and_then(|hour| next_reset_after(Utc::now(), hour));
                    self.status.write().await.next_reset = next_reset;
                }
                () = self.wake.notified() => {}
            }
        }

        self.status.write().await.running = false;
        info!("collection daemon stopped");
        let _ = tx
            .send(DaemonEvent::Stopped {
                reason: StopReason::Requested,
            })
            .await;
    }

    async fn run_cycle(&self, tx: &mpsc::Sender<DaemonEvent>) {
        let run_number = {
            let mut status = self.status.write().await;
            status.total_cycles += 1;
            status.total_cycles
        };
        let _ = tx.send(DaemonEvent::CycleStarted { run_number }).await;

        let start = Instant::now();
        let result = self.notifier.run_cycle().await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(report) => {
                let delivered = report.dispatch.delivered();
                {
                    let mut status = self.status.write().await;
                    status.successful_cycles += 1;
                    status.consecutive_failures = 0;
                    status.reports_delivered += delivered as u64;
                    status.last_cycle = Some(Instant::now());
                }

                let _ = tx
                    .send(DaemonEvent::CycleCompleted {
                        run_number,
                        new_launches: report.outcome.summaries.len(),
                        delivered,
                        duration_ms,
                    })
                    .await;
            }
            Err(e) => {
                let consecutive = {
                    let mut status = self.status.write().await;
                    status.failed_cycles += 1;
                    status.consecutive_failures += 1;
                    status.consecutive_failures
                };
                error!(run_number, consecutive_failures = consecutive, error = %e, "cycle failed");

                let _ = tx
                    .send(DaemonEvent::CycleFailed {
                        run_number,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn run_reset(&self, tx: &mpsc::Sender<DaemonEvent>) {
        match self.notifier.reset_processed().await {
            Ok(cleared) => {
                self.status.write().await.resets += 1;
                let _ = tx.send(DaemonEvent::StoreReset { cleared }).await;
            }
            Err(e) => {
                warn!(error = %e, "daily reset failed");
                let _ = tx
                    .send(DaemonEvent::StoreResetFailed {
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }
}

/// First `hour:00:00` UTC strictly after `now`. `None` for hours outside 0..=23.
pub fn next_reset_after(now: DateTime<Utc>, hour: u32) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(time));
    if today > now {
        Some(today)
    } else {
        today.checked_add_days(Days::new(1))
    }
}
