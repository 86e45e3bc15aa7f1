//! Worker configuration.

use std::path::PathBuf;

use vconvert_models::ExtensionFilter;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
///
/// Storage credentials and the bucket name are read separately by
/// `vconvert_storage::S3Config`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Optional prefix restricting the bucket listing
    pub source_prefix: Option<String>,
    /// Prefix converted files are written under
    pub destination_prefix: String,
    /// Frame rate passed to the transcoder
    pub target_fps: u32,
    /// Object suffixes eligible for processing
    pub accepted_extensions: ExtensionFilter,
    /// Maximum concurrent jobs
    pub worker_count: usize,
    /// Root directory for per-job staging files
    pub work_dir: PathBuf,
    /// Kill a transcode that runs longer than this
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Exit non-zero when any item failed
    pub fail_on_item_error: bool,
    /// Where to write the JSON run report
    pub report_path: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source_prefix: None,
            destination_prefix: "converted_videos".to_string(),
            target_fps: 24,
            accepted_extensions: ExtensionFilter::default(),
            worker_count: default_worker_count(),
            work_dir: std::env::temp_dir().join("vconvert"),
            ffmpeg_timeout_secs: None,
            fail_on_item_error: false,
            report_path: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            source_prefix: std::env::var("SOURCE_PREFIX")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            destination_prefix: std::env::var("DESTINATION_PREFIX")
                .unwrap_or(defaults.destination_prefix),
            target_fps: std::env::var("TARGET_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_fps),
            accepted_extensions: std::env::var("ACCEPTED_EXTENSIONS")
                .map(|s| ExtensionFilter::parse(&s))
                .unwrap_or(defaults.accepted_extensions),
            worker_count: std::env::var("WORKER_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.worker_count),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
            fail_on_item_error: std::env::var("FAIL_ON_ITEM_ERROR")
                .map(|s| parse_flag(&s))
                .unwrap_or(defaults.fail_on_item_error),
            report_path: std::env::var("REPORT_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.worker_count == 0 {
            return Err(WorkerError::config_error("WORKER_COUNT must be at least 1"));
        }
        if self.target_fps == 0 {
            return Err(WorkerError::config_error("TARGET_FPS must be greater than 0"));
        }
        if self.accepted_extensions.is_empty() {
            return Err(WorkerError::config_error("ACCEPTED_EXTENSIONS is empty"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(WorkerError::config_error("WORKER_WORK_DIR is empty"));
        }
        Ok(())
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
