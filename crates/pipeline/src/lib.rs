//! `stockroom-pipeline` — asynchronous bulk import/export.
//!
//! ## Design
//!
//! - A fixed-size worker pool (default 2) shares one job queue
//! - Submission never blocks and returns a correlating [`JobId`]
//! - Failures are per-job: logged, counted, never fatal to the pool
//! - `shutdown` drains within a grace period, then force-cancels
//!
//! ## Components
//!
//! - [`TaskPipeline`]: the pool itself, spawned over a shared store
//! - [`JobKind`]: what a submission will do (import or export)
//! - [`import_file`]/[`export_file`]: the same job bodies, callable
//!   synchronously when the caller wants completion before returning

pub mod job;
pub mod pipeline;

pub use job::{JobError, JobId, JobKind, QueuedJob, export_file, import_file};
pub use pipeline::{PipelineConfig, PipelineError, PipelinePhase, PipelineStats, TaskPipeline};
