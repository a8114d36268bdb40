//! Job scheduling
//!
//! A job runs either on its own interval or after every completed pass of
//! another job. A per-job guard keeps two passes of the same job from
//! overlapping, and every pass runs in its own task so that errors and
//! panics are logged instead of reaching the host process.

mod guard;
mod shutdown;

pub use guard::JobGuard;
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};

use crate::telemetry::{incr_counter, record_latency, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Summary of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Assets, groups or zones looked at
    pub processed: usize,
    /// Items skipped after a recoverable failure
    pub skipped: usize,
    /// Records written
    pub changed: usize,
    /// Pass stopped early on shutdown and rolled back
    pub cancelled: bool,
}

impl PassReport {
    pub fn cancelled(processed: usize) -> Self {
        Self {
            processed,
            cancelled: true,
            ..Self::default()
        }
    }
}

/// A scheduled unit of work
#[async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Histogram the pass duration is recorded to
    fn latency_metric(&self) -> LatencyMetric;

    /// Run one full pass as of `now`
    ///
    /// Implementations check `shutdown` between items, never mid-item.
    async fn run_pass(&self, now: DateTime<Utc>, shutdown: &Shutdown) -> anyhow::Result<PassReport>;
}

/// Run one guarded pass of `job`
///
/// Returns `None` when a pass of the same job is still running or when the
/// pass failed. Failures are logged here.
pub async fn run_guarded(job: Arc<dyn Job>, guard: &JobGuard, shutdown: &Shutdown) -> Option<PassReport> {
    let Some(permit) = guard.try_acquire() else {
        tracing::debug!(job = job.name(), "Previous pass still running, skipping");
        return None;
    };

    let name = job.name();
    let metric = job.latency_metric();
    let started = Instant::now();
    let task_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        let _permit = permit;
        job.run_pass(Utc::now(), &task_shutdown).await
    });

    let outcome = handle.await;
    record_latency(metric, started.elapsed());

    match outcome {
        Ok(Ok(report)) => {
            tracing::info!(
                job = name,
                processed = report.processed,
                skipped = report.skipped,
                changed = report.changed,
                cancelled = report.cancelled,
                "Pass complete"
            );
            Some(report)
        }
        Ok(Err(e)) => {
            incr_counter(CounterMetric::PassFailures, 1);
            tracing::error!(job = name, error = %e, "Pass failed");
            None
        }
        Err(e) => {
            incr_counter(CounterMetric::PassFailures, 1);
            tracing::error!(job = name, error = %e, "Pass panicked");
            None
        }
    }
}

/// When a registered job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// On a fixed interval, starting immediately
    Every(Duration),
    /// After each pass of the named job that completed without being cancelled
    After(&'static str),
}

/// Runs registered jobs until shutdown
pub struct Scheduler {
    jobs: Vec<(Arc<dyn Job>, Schedule)>,
    shutdown: Shutdown,
}

impl Scheduler {
    pub fn new(shutdown: Shutdown) -> Self {
        Self {
            jobs: Vec::new(),
            shutdown,
        }
    }

    pub fn register(&mut self, job: Arc<dyn Job>, schedule: Schedule) {
        self.jobs.push((job, schedule));
    }

    /// Spawn one loop per job
    pub fn start(self) -> Vec<JoinHandle<()>> {
        let mut followers: HashMap<&'static str, Vec<Arc<Notify>>> = HashMap::new();
        let mut triggers = Vec::with_capacity(self.jobs.len());
        for (job, schedule) in &self.jobs {
            let trigger = match schedule {
                Schedule::Every(every) => Trigger::Every(*every),
                Schedule::After(upstream) => {
                    let upstream = *upstream;
                    if !self.jobs.iter().any(|(j, _)| j.name() == upstream) {
                        tracing::warn!(job = job.name(), upstream, "Upstream job not registered, job will never run");
                    }
                    let notify = Arc::new(Notify::new());
                    followers.entry(upstream).or_default().push(notify.clone());
                    Trigger::Notified(notify)
                }
            };
            triggers.push(trigger);
        }

        self.jobs
            .into_iter()
            .zip(triggers)
            .map(|((job, _), trigger)| {
                let downstream = followers.remove(job.name()).unwrap_or_default();
                tokio::spawn(job_loop(job, trigger, downstream, self.shutdown.clone()))
            })
            .collect()
    }
}

enum Trigger {
    Every(Duration),
    Notified(Arc<Notify>),
}

/// Spawn a detached guarded pass, waking `downstream` when it completes
fn spawn_pass(job: &Arc<dyn Job>, guard: &JobGuard, downstream: &Arc<Vec<Arc<Notify>>>, shutdown: &Shutdown) {
    let job = job.clone();
    let guard = guard.clone();
    let downstream = downstream.clone();
    let pass_shutdown = shutdown.clone();
    // Detached so a slow pass does not hold up the loop
    tokio::spawn(async move {
        if let Some(report) = run_guarded(job, &guard, &pass_shutdown).await {
            if !report.cancelled {
                for notify in downstream.iter() {
                    notify.notify_one();
                }
            }
        }
    });
}

async fn job_loop(job: Arc<dyn Job>, trigger: Trigger, downstream: Vec<Arc<Notify>>, shutdown: Shutdown) {
    let guard = JobGuard::new();
    let downstream = Arc::new(downstream);

    match trigger {
        Trigger::Every(every) => {
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(job = job.name(), every_secs = every.as_secs(), "Job scheduled");

            loop {
                tokio::select! {
                    _ = ticker.tick() => spawn_pass(&job, &guard, &downstream, &shutdown),
                    _ = shutdown.wait() => break,
                }
            }
        }
        Trigger::Notified(notify) => {
            tracing::info!(job = job.name(), "Job scheduled after upstream passes");

            loop {
                tokio::select! {
                    _ = notify.notified() => spawn_pass(&job, &guard, &downstream, &shutdown),
                    _ = shutdown.wait() => break,
                }
            }
        }
    }
    tracing::info!(job = job.name(), "Job stopped");
}
