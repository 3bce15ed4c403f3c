use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::{ScanPipeline, ScanStatus};

/// Point-in-time view of the periodic scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub running: bool,
    /// Scheduled jobs; 1 while the scan timer is active
    pub jobs: usize,
    pub next_run: Option<DateTime<Local>>,
    pub interval_secs: u64,
}

/// Shared scheduler state read by the status endpoint
#[derive(Debug, Default)]
pub struct SchedulerStatus {
    running: AtomicBool,
    interval_secs: AtomicU64,
    next_run: RwLock<Option<DateTime<Local>>>,
}

impl SchedulerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn next_run(&self) -> Option<DateTime<Local>> {
        *self.next_run.read().await
    }

    pub async fn snapshot(&self) -> SchedulerSnapshot {
        let running = self.is_running();
        SchedulerSnapshot {
            running,
            jobs: usize::from(running),
            next_run: self.next_run().await,
            interval_secs: self.interval_secs.load(Ordering::Relaxed),
        }
    }

    async fn started(&self, interval_secs: u64, next_run: DateTime<Local>) {
        self.interval_secs.store(interval_secs, Ordering::Relaxed);
        *self.next_run.write().await = Some(next_run);
        self.running.store(true, Ordering::Release);
    }

    async fn scheduled(&self, next_run: DateTime<Local>) {
        *self.next_run.write().await = Some(next_run);
    }

    async fn stopped(&self) {
        self.running.store(false, Ordering::Release);
        *self.next_run.write().await = None;
    }
}

/// Background scheduler that runs the scan pipeline on a fixed interval
pub struct SchedulerService {
    pipeline: Arc<ScanPipeline>,
    status: Arc<SchedulerStatus>,
    interval_secs: u64,
    run_on_start: bool,
}

impl SchedulerService {
    /// Create a scheduler that scans every `interval_secs` (0 disables the timer)
    pub fn new(pipeline: Arc<ScanPipeline>, interval_secs: u64) -> Self {
        Self {
            pipeline,
            status: Arc::new(SchedulerStatus::new()),
            interval_secs,
            run_on_start: false,
        }
    }

    /// Run the first scan immediately instead of one interval after start
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    /// Share an existing status handle (e.g. one already given to the HTTP server)
    pub fn with_status(mut self, status: Arc<SchedulerStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> Arc<SchedulerStatus> {
        self.status.clone()
    }

    /// Run scans in a loop until shutdown signal
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval_secs == 0 {
            info!("Background scheduler disabled (scan_interval_secs = 0)");
            // Still wait for shutdown
            let _ = shutdown.changed().await;
            return;
        }

        let period = Duration::from_secs(self.interval_secs);
        let chrono_period = chrono::Duration::seconds(self.interval_secs as i64);

        let first_delay = if self.run_on_start { Duration::ZERO } else { period };
        let mut scan_interval = tokio::time::interval_at(Instant::now() + first_delay, period);
        scan_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let first_run = Local::now() + chrono::Duration::from_std(first_delay).unwrap_or(chrono_period);
        self.status.started(self.interval_secs, first_run).await;

        info!("Scheduler started: scan every {}s, first run at {}", self.interval_secs, first_run.format("%H:%M:%S"));

        loop {
            tokio::select! {
                // Handle shutdown signal
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = scan_interval.tick() => {
                    self.status.scheduled(Local::now() + chrono_period).await;

                    debug!("Running scheduled scan");
                    let report = self.pipeline.run_once().await;
                    match report.status {
                        ScanStatus::Success => {
                            info!(
                                "Scheduled scan: {} fetched, {} matched, alert sent: {}",
                                report.fetched, report.matched, report.alert_sent
                            );
                        }
                        ScanStatus::Skipped => {
                            warn!("Scheduled scan skipped: previous scan still running");
                        }
                        ScanStatus::Error => {
                            error!(
                                "Scheduled scan failed: {}",
                                report.error.as_deref().unwrap_or("unknown error")
                            );
                        }
                    }
                }
            }
        }

        self.status.stopped().await;
        info!("Scheduler stopped");
    }
}
