//! Periodic job scheduler
//!
//! Each job runs on its own tokio task driven by `tokio::time::interval`
//! (missed ticks are skipped, never queued) and stops when its `watch`
//! shutdown channel flips. A tick that is already running always finishes;
//! shutdown is only observed between ticks.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tradehive_common::Result;

/// A periodic unit of work
///
/// `tick` can be called directly, which is how jobs are tested without
/// waiting on wall-clock time.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn tick(&self) -> Result<()>;
}

/// Handle to one running job
pub struct JobHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl JobHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop scheduling further ticks and wait for the task; returns ticks run
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown_tx.send(true);
        match self.task.await {
            Ok(ticks) => ticks,
            Err(e) => {
                warn!(job = self.name, error = %e, "Job task ended abnormally");
                0
            }
        }
    }
}

/// Spawn `job` to tick every `period`; the first tick happens after one period
pub fn spawn_job(job: Arc<dyn Job>, period: Duration) -> JobHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let name = job.name();
    let task = tokio::spawn(run_job(job, period, shutdown_rx));
    JobHandle {
        name,
        shutdown_tx,
        task,
    }
}

async fn run_job(job: Arc<dyn Job>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval fires immediately once
    ticker.tick().await;

    info!(job = job.name(), period_ms = period.as_millis() as u64, "Job started");

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                ticks += 1;
                match job.tick().await {
                    Ok(()) => debug!(job = job.name(), ticks, "Job tick completed"),
                    Err(e) => error!(job = job.name(), error = %e, "Job tick failed"),
                }
            }
        }
    }

    info!(job = job.name(), ticks, "Job stopped");
    ticks
}

/// Owns the running jobs
#[derive(Default)]
pub struct Scheduler {
    handles: Mutex<Vec<JobHandle>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, job: Arc<dyn Job>, period: Duration) {
        let handle = spawn_job(job, period);
        self.handles.lock().push(handle);
    }

    /// Names of the jobs still registered
    pub fn running(&self) -> Vec<&'static str> {
        self.handles.lock().iter().map(|h| h.name()).collect()
    }

    /// Stop one job by name; None when no such job is registered
    pub async fn stop(&self, name: &str) -> Option<u64> {
        let handle = {
            let mut handles = self.handles.lock();
            let idx = handles.iter().position(|h| h.name() == name)?;
            handles.swap_remove(idx)
        };
        Some(handle.stop().await)
    }

    /// Stop every job and wait for all of them
    pub async fn shutdown(&self) {
        let handles: Vec<JobHandle> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let name = handle.name();
            let ticks = handle.stop().await;
            debug!(job = name, ticks, "Job shut down");
        }
    }
}
