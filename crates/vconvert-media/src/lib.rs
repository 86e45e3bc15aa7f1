//! FFmpeg CLI wrapper for batch transcoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout support via tokio
//! - The [`Transcoder`] trait and its FFmpeg implementation

pub mod command;
pub mod error;
pub mod progress;
pub mod transcoder;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use transcoder::{FfmpegTranscoder, Transcoder};
