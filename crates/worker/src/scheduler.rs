//! Owned handle over a recurring background task.
//!
//! [`ScheduledJob::start`] spawns a loop that sleeps until the next fire time
//! of its [`Schedule`], runs the job to completion, logs the outcome and
//! repeats. The next fire time is computed only after a run finishes, so
//! runs of one job never overlap. Each run is its own task: a run that
//! fails or panics is logged and the loop keeps going.
//!
//! Sleeping is done in bounded slices against the wall clock, so a month-long
//! wait still fires on time after a host suspend or clock adjustment.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use loyalty_core::schedule::Schedule;
use loyalty_core::types::Timestamp;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Longest single sleep before the remaining delay is recomputed.
const MAX_SLEEP_SLICE: Duration = Duration::from_secs(3600);

/// A running scheduled job.
///
/// Dropping the handle leaves the task running; call
/// [`shutdown`](Self::shutdown) to stop it and wait for it to exit.
pub struct ScheduledJob {
    name: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    runs: Arc<AtomicU64>,
}

impl ScheduledJob {
    /// Spawn `job` to run at every fire time of `schedule`.
    ///
    /// Each run receives a child of the job's cancellation token.
    pub fn start<F, Fut, E>(name: impl Into<String>, schedule: Schedule, job: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        Self::spawn(name.into(), schedule, job, false)
    }

    /// Like [`start`](Self::start), but also runs `job` once immediately.
    pub fn start_with_initial_run<F, Fut, E>(
        name: impl Into<String>,
        schedule: Schedule,
        job: F,
    ) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        Self::spawn(name.into(), schedule, job, true)
    }

    fn spawn<F, Fut, E>(name: String, schedule: Schedule, job: F, run_first: bool) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let runs = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(run_loop(
            name.clone(),
            schedule,
            job,
            run_first,
            cancel.clone(),
            Arc::clone(&runs),
        ));

        Self {
            name,
            cancel,
            handle,
            runs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs that finished, successfully or not.
    pub fn completed_runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the loop to stop. An in-flight run sees its token cancelled and
    /// is aborted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(self) {
        let Self {
            name,
            cancel,
            handle,
            ..
        } = self;

        cancel.cancel();
        if let Err(e) = handle.await {
            tracing::error!(job = %name, error = %e, "Scheduled job task panicked");
        }
    }
}

async fn run_loop<F, Fut, E>(
    name: String,
    schedule: Schedule,
    job: F,
    run_first: bool,
    cancel: CancellationToken,
    runs: Arc<AtomicU64>,
) where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tracing::info!(job = %name, %schedule, run_first, "Scheduled job started");

    let mut run_now = run_first;
    loop {
        if !run_now {
            let Some(next) = schedule.next_fire_after(Utc::now()) else {
                tracing::error!(job = %name, %schedule, "No representable next fire time");
                break;
            };
            tracing::info!(job = %name, next_run = %next, "Next run scheduled");

            if !sleep_until(next, &cancel).await {
                break;
            }
        }
        run_now = false;

        let started = Instant::now();
        let mut run = tokio::spawn(job(cancel.child_token()));
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                run.abort();
                tracing::warn!(job = %name, "Scheduled job cancelled mid-run");
                break;
            }
            joined = &mut run => joined,
        };

        runs.fetch_add(1, Ordering::SeqCst);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match joined {
            Ok(Ok(())) => tracing::info!(job = %name, elapsed_ms, "Scheduled job run completed"),
            Ok(Err(e)) => tracing::error!(
                job = %name,
                elapsed_ms,
                error = %e,
                "Scheduled job run failed"
            ),
            Err(e) if e.is_panic() => tracing::error!(
                job = %name,
                elapsed_ms,
                "Scheduled job run panicked"
            ),
            Err(e) => tracing::error!(
                job = %name,
                elapsed_ms,
                error = %e,
                "Scheduled job run did not complete"
            ),
        }
    }

    tracing::info!(job = %name, "Scheduled job stopping");
}

/// Sleep until `deadline`. Returns `false` if cancelled first.
async fn sleep_until(deadline: Timestamp, cancel: &CancellationToken) -> bool {
    loop {
        let now = Utc::now();
        if now >= deadline {
            return true;
        }
        let remaining = (deadline - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(MAX_SLEEP_SLICE);

        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(remaining) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
