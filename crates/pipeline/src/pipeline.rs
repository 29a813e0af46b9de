//! Fixed-size worker pool for bulk import/export jobs.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use stockroom_store::InventoryStore;

use crate::job::{self, JobError, JobId, JobKind, QueuedJob};

/// Pipeline sizing and identification.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of worker threads. Two is enough to keep an import and an
    /// export from serializing each other while bounding open file handles.
    pub workers: usize,
    /// How long `shutdown` waits for queued and in-flight jobs to drain
    /// before forcing cancellation.
    pub grace_period: Duration,
    /// Name used for worker threads and log output.
    pub name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            grace_period: Duration::from_secs(5),
            name: "bulk-pipeline".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Submission failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Shutdown has begun; the job was rejected, not queued.
    #[error("pipeline is shutting down, submission rejected")]
    Terminated,
}

/// Pipeline lifecycle. Transitions are one-way:
/// `Running → ShuttingDown → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Running,
    ShuttingDown,
    Terminated,
}

/// Pipeline runtime counters.
///
/// `jobs_cancelled` counts both in-flight jobs that observed the cancellation
/// flag and queued jobs dropped when the grace period ran out.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PipelineStats {
    pub jobs_submitted: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_cancelled: u64,
}

struct PoolState {
    phase: PipelinePhase,
    queue: VecDeque<QueuedJob>,
    in_flight: usize,
}

struct Shared {
    store: Arc<InventoryStore>,
    state: Mutex<PoolState>,
    /// Signalled on submission and on every phase change.
    work_ready: Condvar,
    /// Signalled whenever the pool becomes idle (empty queue, nothing running).
    drained: Condvar,
    cancel: AtomicBool,
    stats: Mutex<PipelineStats>,
}

/// Asynchronous bulk-I/O pipeline over a shared [`InventoryStore`].
///
/// Submission is fire-and-forget: `submit_*` enqueues and returns
/// immediately with a [`JobId`]; completion and failure surface through the
/// log and [`stats`](Self::stats), never back to the submitter. Job failures
/// are contained per job — a malformed file or I/O error never takes down a
/// worker or affects other queued jobs.
///
/// The queue is unbounded; nothing pushes back on a submitter that outruns
/// the pool. Known limitation.
pub struct TaskPipeline {
    shared: Arc<Shared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    grace_period: Duration,
    name: String,
}

impl TaskPipeline {
    /// Spawn the worker pool against `store`.
    pub fn spawn(store: Arc<InventoryStore>, config: PipelineConfig) -> Self {
        let shared = Arc::new(Shared {
            store,
            state: Mutex::new(PoolState {
                phase: PipelinePhase::Running,
                queue: VecDeque::new(),
                in_flight: 0,
            }),
            work_ready: Condvar::new(),
            drained: Condvar::new(),
            cancel: AtomicBool::new(false),
            stats: Mutex::new(PipelineStats::default()),
        });

        let workers = (0..config.workers.max(1))
            .map(|index| {
                let shared = shared.clone();
                thread::Builder::new()
                    .name(format!("{}-{}", config.name, index))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn pipeline worker thread")
            })
            .collect();

        info!(pipeline = %config.name, workers = config.workers.max(1), "pipeline started");

        Self {
            shared,
            workers: Mutex::new(workers),
            grace_period: config.grace_period,
            name: config.name,
        }
    }

    /// Queue a bulk import of the file at `path`. Never blocks.
    pub fn submit_import(&self, path: impl Into<PathBuf>) -> Result<JobId, PipelineError> {
        self.submit(JobKind::import(path))
    }

    /// Queue a bulk export to the file at `path`. Never blocks.
    pub fn submit_export(&self, path: impl Into<PathBuf>) -> Result<JobId, PipelineError> {
        self.submit(JobKind::export(path))
    }

    fn submit(&self, kind: JobKind) -> Result<JobId, PipelineError> {
        let job = QueuedJob::new(kind);
        let id = job.id;
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.phase != PipelinePhase::Running {
                debug!(job_id = %id, kind = job.kind.label(), "submission rejected after shutdown");
                return Err(PipelineError::Terminated);
            }
            state.queue.push_back(job);
        }
        self.shared.stats.lock().unwrap().jobs_submitted += 1;
        self.shared.work_ready.notify_one();
        debug!(job_id = %id, "job queued");
        Ok(id)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> PipelinePhase {
        self.shared.state.lock().unwrap().phase
    }

    /// Snapshot of the runtime counters.
    pub fn stats(&self) -> PipelineStats {
        self.shared.stats.lock().unwrap().clone()
    }

    /// Stop accepting submissions, wait up to the grace period for queued and
    /// in-flight jobs to drain, then force-cancel whatever remains.
    ///
    /// Blocks the caller for at most the grace period. On a clean drain the
    /// workers are joined; on a forced cancellation their threads are left to
    /// finish their current job, which ends at its next cancellation check
    /// point or runs to completion — a best-effort cutoff, not a guaranteed
    /// one. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.phase == PipelinePhase::Terminated {
                return;
            }
            state.phase = PipelinePhase::ShuttingDown;
        }
        self.shared.work_ready.notify_all();
        info!(pipeline = %self.name, "pipeline shutting down");

        let deadline = Instant::now() + self.grace_period;
        let mut state = self.shared.state.lock().unwrap();
        while !(state.queue.is_empty() && state.in_flight == 0) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = self
                .shared
                .drained
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = guard;
        }

        let drained = state.queue.is_empty() && state.in_flight == 0;
        state.phase = PipelinePhase::Terminated;
        let dropped = state.queue.len();
        state.queue.clear();
        drop(state);

        if drained {
            self.shared.work_ready.notify_all();
            for handle in self.workers.lock().unwrap().drain(..) {
                let _ = handle.join();
            }
            info!(pipeline = %self.name, "pipeline terminated after drain");
        } else {
            self.shared.cancel.store(true, Ordering::SeqCst);
            self.shared.work_ready.notify_all();
            if dropped > 0 {
                self.shared.stats.lock().unwrap().jobs_cancelled += dropped as u64;
            }
            // Stragglers are detached, not joined: shutdown returns now.
            self.workers.lock().unwrap().clear();
            warn!(
                pipeline = %self.name,
                dropped_jobs = dropped,
                "grace period elapsed, cancelling remaining jobs"
            );
        }
    }
}

impl Drop for TaskPipeline {
    fn drop(&mut self) {
        // Dropping without shutdown still lets workers drain and exit; it
        // just never blocks.
        let mut state = self.shared.state.lock().unwrap();
        if state.phase == PipelinePhase::Running {
            state.phase = PipelinePhase::ShuttingDown;
        }
        drop(state);
        self.shared.work_ready.notify_all();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    debug!("pipeline worker started");
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    state.in_flight += 1;
                    break Some(job);
                }
                if state.phase != PipelinePhase::Running {
                    break None;
                }
                state = shared.work_ready.wait(state).unwrap();
            }
        };

        let Some(job) = job else {
            break;
        };

        execute(&shared, job);

        let mut state = shared.state.lock().unwrap();
        state.in_flight -= 1;
        if state.queue.is_empty() && state.in_flight == 0 {
            shared.drained.notify_all();
        }
    }
    debug!("pipeline worker stopped");
}

/// Catch boundary: a job-level `Err` becomes a log record and a stats bump,
/// never a worker panic.
fn execute(shared: &Shared, job: QueuedJob) {
    let queued_ms = (Utc::now() - job.submitted_at).num_milliseconds().max(0) as u64;
    let started = Instant::now();
    let result = job::run(&job.kind, &shared.store, &shared.cancel);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let mut stats = shared.stats.lock().unwrap();
    match result {
        Ok(records) => {
            stats.jobs_succeeded += 1;
            drop(stats);
            info!(
                job_id = %job.id,
                kind = job.kind.label(),
                path = %job.kind.path().display(),
                records,
                queued_ms,
                elapsed_ms,
                "job completed"
            );
        }
        Err(JobError::Cancelled) => {
            stats.jobs_cancelled += 1;
            drop(stats);
            warn!(
                job_id = %job.id,
                kind = job.kind.label(),
                path = %job.kind.path().display(),
                "job cancelled during shutdown"
            );
        }
        Err(err) => {
            stats.jobs_failed += 1;
            drop(stats);
            error!(
                job_id = %job.id,
                kind = job.kind.label(),
                path = %job.kind.path().display(),
                error = %err,
                "job failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_pipeline() -> (TaskPipeline, Arc<InventoryStore>) {
        let store = InventoryStore::arc();
        let pipeline = TaskPipeline::spawn(
            store.clone(),
            PipelineConfig::default().with_name("test-pipeline"),
        );
        (pipeline, store)
    }

    #[test]
    fn config_defaults_to_two_workers_and_five_second_grace() {
        let config = PipelineConfig::default();
        assert_eq!(config.workers, 2);
        assert_eq!(config.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn pipeline_starts_running_and_terminates_on_shutdown() {
        let (pipeline, _store) = idle_pipeline();
        assert_eq!(pipeline.phase(), PipelinePhase::Running);

        pipeline.shutdown();
        assert_eq!(pipeline.phase(), PipelinePhase::Terminated);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (pipeline, _store) = idle_pipeline();
        pipeline.shutdown();
        pipeline.shutdown();
        assert_eq!(pipeline.phase(), PipelinePhase::Terminated);
    }

    #[test]
    fn submission_after_shutdown_is_rejected() {
        let (pipeline, store) = idle_pipeline();
        pipeline.shutdown();

        let err = pipeline.submit_import("does-not-matter.csv").unwrap_err();
        assert_eq!(err, PipelineError::Terminated);
        let err = pipeline.submit_export("also-rejected.csv").unwrap_err();
        assert_eq!(err, PipelineError::Terminated);

        // Nothing was queued or counted.
        assert_eq!(pipeline.stats().jobs_submitted, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn submissions_get_distinct_job_ids_and_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _store) = idle_pipeline();

        let a = pipeline.submit_export(dir.path().join("a.csv")).unwrap();
        let b = pipeline.submit_export(dir.path().join("b.csv")).unwrap();
        assert_ne!(a, b);

        pipeline.shutdown();
        let stats = pipeline.stats();
        assert_eq!(stats.jobs_submitted, 2);
        assert_eq!(stats.jobs_succeeded, 2);
    }

    #[test]
    fn shutdown_with_an_empty_queue_returns_promptly() {
        let (pipeline, _store) = idle_pipeline();

        let started = Instant::now();
        pipeline.shutdown();
        // Nowhere near the 5s grace period.
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
