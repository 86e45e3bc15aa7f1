//! Transcoder abstraction.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Converts one local file into another at a fixed frame rate.
///
/// Implementations do not clean up partial output; the caller owns the
/// staging files.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path, target_fps: u32) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the FFmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
}

impl FfmpegTranscoder {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Build the conversion command.
    pub fn command(input: &Path, output: &Path, target_fps: u32) -> FfmpegCommand {
        FfmpegCommand::new(input, output).frame_rate(target_fps)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(&self, input: &Path, output: &Path, target_fps: u32) -> MediaResult<()> {
        if target_fps == 0 {
            return Err(MediaError::InvalidFrameRate(target_fps));
        }
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        let cmd = Self::command(input, output, target_fps);
        let label = input.display().to_string();

        self.runner
            .run_with_progress(&cmd, move |progress| {
                debug!(
                    input = %label,
                    frame = progress.frame,
                    out_time_ms = progress.out_time_ms,
                    speed = progress.speed,
                    "FFmpeg progress"
                );
            })
            .await?;

        info!(
            "Converted {} to {} with {} FPS",
            input.display(),
            output.display(),
            target_fps
        );
        Ok(())
    }
}
