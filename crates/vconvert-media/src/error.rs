//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while invoking the transcoder.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    FfmpegNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(u32),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    ///
    /// The last stderr lines, when present, are folded into the message so
    /// that the cause survives being flattened into a report line.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        let mut message = message.into();
        if let Some(code) = exit_code {
            message = format!("{} (exit code {})", message, code);
        }
        if let Some(last) = stderr.as_deref().and_then(|s| s.lines().last()) {
            message = format!("{}: {}", message, last.trim());
        }

        Self::FfmpegFailed {
            message,
            stderr,
            exit_code,
        }
    }
}
