//! Worker error types.

use thiserror::Error;

use vconvert_media::MediaError;
use vconvert_models::FailureStage;
use vconvert_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Run-level errors. Only these can abort a batch.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Discovery failed: {0}")]
    Discovery(#[source] StorageError),

    #[error("Discovery failed: {0}")]
    ListingStalled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error happened while enumerating the bucket.
    pub fn is_discovery(&self) -> bool {
        matches!(self, WorkerError::Discovery(_) | WorkerError::ListingStalled(_))
    }
}

/// Per-job errors. These never leave the job runner; they are turned into a
/// failed `JobOutcome`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("download failed: {0}")]
    Fetch(#[source] StorageError),

    #[error("transcode failed: {0}")]
    Transcode(#[source] MediaError),

    #[error("upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("cancelled by shutdown before {0}")]
    Cancelled(&'static str),
}

impl JobError {
    /// Pipeline step this error belongs to.
    pub fn stage(&self) -> FailureStage {
        match self {
            JobError::Staging(_) => FailureStage::Staging,
            JobError::Fetch(_) => FailureStage::Fetch,
            JobError::Transcode(_) => FailureStage::Transcode,
            JobError::Upload(_) => FailureStage::Upload,
            JobError::Cancelled(_) => FailureStage::Cancelled,
        }
    }
}
