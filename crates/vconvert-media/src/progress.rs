//! FFmpeg progress parsing.
//!
//! With `-progress pipe:2` FFmpeg interleaves `key=value` progress blocks with
//! its own diagnostics on stderr. [`ProgressParser`] folds the progress keys
//! into snapshots and hands every other line back to the caller.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current encoding FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

/// Classification of one stderr line.
#[derive(Debug, Clone, PartialEq)]
pub enum StderrLine {
    /// A progress key that did not close a block
    Progress,
    /// The `progress=` key closing a block, with the accumulated snapshot
    Snapshot(FfmpegProgress),
    /// Anything else (warnings, errors)
    Diagnostic(String),
}

/// Keys FFmpeg emits in a `-progress` block.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Stateful parser for FFmpeg stderr.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current: FfmpegProgress,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line, updating the running snapshot.
    pub fn parse_line(&mut self, line: &str) -> StderrLine {
        let trimmed = line.trim();

        let Some((key, value)) = trimmed.split_once('=') else {
            return StderrLine::Diagnostic(trimmed.to_string());
        };

        if !PROGRESS_KEYS.contains(&key) && !key.starts_with("stream_") {
            return StderrLine::Diagnostic(trimmed.to_string());
        }

        match key {
            "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.current.fps = fps;
                }
            }
            "speed" => {
                // Format: "1.5x" or "N/A"
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.current.speed = speed;
                }
            }
            "progress" => {
                self.current.is_complete = value == "end";
                return StderrLine::Snapshot(self.current.clone());
            }
            _ => {}
        }

        StderrLine::Progress
    }
}
