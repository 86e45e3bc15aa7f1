//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for job processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the source key and the pipeline step so that log
/// lines from concurrent jobs can be told apart.
#[derive(Debug, Clone)]
pub struct JobLogger {
    key: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a source key and operation.
    pub fn new(key: &str, operation: &str) -> Self {
        Self {
            key: key.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, message: &str) {
        info!(
            key = %self.key,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a completed pipeline step.
    pub fn log_progress(&self, step: &str, message: &str) {
        info!(
            key = %self.key,
            operation = %self.operation,
            step = step,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            key = %self.key,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log the failure of a job.
    pub fn log_error(&self, stage: &str, message: &str) {
        error!(
            key = %self.key,
            operation = %self.operation,
            stage = stage,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, message: &str) {
        info!(
            key = %self.key,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            key = %self.key,
            operation = %self.operation
        )
    }
}
