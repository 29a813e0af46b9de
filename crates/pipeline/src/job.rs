//! Bulk job descriptors and their blocking bodies.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use stockroom_codec::CodecError;
use stockroom_store::InventoryStore;

/// Unique job identifier, minted at submission time.
///
/// Appears in every log line a job emits, so an asynchronous failure can be
/// correlated with the submission that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a queued job will do when a worker picks it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Read the file at `path` and apply its records to the store.
    Import { path: PathBuf },
    /// Snapshot the store and write it to `path`.
    Export { path: PathBuf },
}

impl JobKind {
    pub fn import(path: impl Into<PathBuf>) -> Self {
        Self::Import { path: path.into() }
    }

    pub fn export(path: impl Into<PathBuf>) -> Self {
        Self::Export { path: path.into() }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Import { .. } => "import",
            JobKind::Export { .. } => "export",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            JobKind::Import { path } => path,
            JobKind::Export { path } => path,
        }
    }
}

/// A submitted job waiting in (or claimed from) the pool queue.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: JobId,
    pub kind: JobKind,
    pub submitted_at: DateTime<Utc>,
}

impl QueuedJob {
    pub(crate) fn new(kind: JobKind) -> Self {
        Self {
            id: JobId::new(),
            kind,
            submitted_at: Utc::now(),
        }
    }
}

/// Failure of a single bulk job.
///
/// Confined to the job that raised it: the worker loop converts this into a
/// log record and a stats bump, and moves on to the next job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("csv format error: {0}")]
    Format(#[from] CodecError),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled during pipeline shutdown")]
    Cancelled,
}

/// Run a job body against the store, observing `cancel` at the job's natural
/// check points.
pub(crate) fn run(
    kind: &JobKind,
    store: &InventoryStore,
    cancel: &AtomicBool,
) -> Result<usize, JobError> {
    match kind {
        JobKind::Import { path } => import(store, path, cancel),
        JobKind::Export { path } => export(store, path, cancel),
    }
}

/// Blocking import: apply the records in `path` to the store, in file order.
///
/// Returns the number of records applied. Not transactional: a malformed line
/// aborts the job but leaves every record before it already applied.
pub fn import_file(store: &InventoryStore, path: impl AsRef<Path>) -> Result<usize, JobError> {
    import(store, path.as_ref(), &AtomicBool::new(false))
}

/// Blocking export: write a point-in-time snapshot of the store to `path`.
///
/// Returns the number of records written.
pub fn export_file(store: &InventoryStore, path: impl AsRef<Path>) -> Result<usize, JobError> {
    export(store, path.as_ref(), &AtomicBool::new(false))
}

fn import(store: &InventoryStore, path: &Path, cancel: &AtomicBool) -> Result<usize, JobError> {
    let text = fs::read_to_string(path)?;

    let mut applied = 0usize;
    for parsed in stockroom_codec::records(&text) {
        if cancel.load(Ordering::Relaxed) {
            return Err(JobError::Cancelled);
        }
        store.add(parsed?);
        applied += 1;
    }
    Ok(applied)
}

fn export(store: &InventoryStore, path: &Path, cancel: &AtomicBool) -> Result<usize, JobError> {
    if cancel.load(Ordering::Relaxed) {
        return Err(JobError::Cancelled);
    }

    // Snapshot at job start: mutations racing the encode are not reflected.
    let snapshot = store.list();
    let encoded = stockroom_codec::encode(&snapshot);

    if cancel.load(Ordering::Relaxed) {
        return Err(JobError::Cancelled);
    }
    fs::write(path, encoded)?;
    Ok(snapshot.len())
}
