//! Per-job outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message carried by every successful outcome.
pub const SUCCESS_MESSAGE: &str = "processed";

/// Terminal status of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failure => "failure",
        }
    }
}

/// Pipeline step at which a job stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Local staging files could not be created
    Staging,
    /// Downloading the source object failed
    Fetch,
    /// The transcoder could not be launched or exited non-zero
    Transcode,
    /// Uploading the converted file failed
    Upload,
    /// Shutdown was requested before the job finished
    Cancelled,
    /// The job task panicked or was aborted
    Aborted,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Staging => "staging",
            FailureStage::Fetch => "fetch",
            FailureStage::Transcode => "transcode",
            FailureStage::Upload => "upload",
            FailureStage::Cancelled => "cancelled",
            FailureStage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing one source object.
///
/// Built only through [`JobOutcome::success`] and [`JobOutcome::failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Source object key
    pub key: String,
    /// Success or failure
    pub status: OutcomeStatus,
    /// `"processed"` on success, the cause on failure
    pub message: String,
    /// Step that failed (failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,
    /// Key the converted file was written to (successes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_key: Option<String>,
    /// Wall-clock time spent on the job
    pub duration_ms: u64,
}

impl JobOutcome {
    pub fn success(
        key: impl Into<String>,
        destination_key: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Success,
            message: SUCCESS_MESSAGE.to_string(),
            stage: None,
            destination_key: Some(destination_key.into()),
            duration_ms,
        }
    }

    pub fn failure(
        key: impl Into<String>,
        stage: FailureStage,
        cause: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Failure,
            message: cause.into(),
            stage: Some(stage),
            destination_key: None,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            OutcomeStatus::Success => write!(f, "Processed {} successfully.", self.key),
            OutcomeStatus::Failure => write!(f, "Failed to process {}: {}", self.key, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_outcome() {
        let outcome = JobOutcome::success("clip1.webm", "converted_videos/clip1.mp4", 12);
        assert!(outcome.is_success());
        assert_eq!(outcome.message, SUCCESS_MESSAGE);
        assert_eq!(outcome.stage, None);
        assert_eq!(outcome.to_string(), "Processed clip1.webm successfully.");
    }

    #[test]
    fn test_failure_outcome() {
        let outcome = JobOutcome::failure("clip2.webm", FailureStage::Transcode, "exit code 1", 5);
        assert!(!outcome.is_success());
        assert_eq!(outcome.destination_key, None);
        assert_eq!(outcome.to_string(), "Failed to process clip2.webm: exit code 1");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome =
            JobOutcome::failure("a.mp4", FailureStage::Fetch, "Object not found: a.mp4", 1);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["stage"], "fetch");
        assert!(json.get("destination_key").is_none());
    }
}
