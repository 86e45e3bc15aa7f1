//! Batch transcoding worker.
//!
//! This crate provides:
//! - Paginated discovery of source objects
//! - A bounded worker pool running one download → transcode → upload job per object
//! - Per-job failure isolation and guaranteed staging cleanup
//! - The aggregate run report and its JSON export
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod job_runner;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod staging;

pub use config::WorkerConfig;
pub use error::{JobError, WorkerError, WorkerResult};
pub use job_runner::JobRunner;
pub use logging::JobLogger;
pub use orchestrator::Orchestrator;
pub use report::{exit_code, write_report};
pub use staging::StagingFiles;
