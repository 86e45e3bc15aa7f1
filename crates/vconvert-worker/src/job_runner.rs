//! Single-object pipeline: fetch → transcode → upload → cleanup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::Instrument;

use vconvert_media::Transcoder;
use vconvert_models::{destination_key, JobOutcome, SourceObject};
use vconvert_storage::ObjectStore;

use crate::config::WorkerConfig;
use crate::error::JobError;
use crate::logging::JobLogger;
use crate::staging::StagingFiles;

/// Runs the pipeline for one source object and turns every failure into a
/// [`JobOutcome`]. Invocations share nothing mutable with each other.
#[derive(Clone)]
pub struct JobRunner {
    store: Arc<dyn ObjectStore>,
    transcoder: Arc<dyn Transcoder>,
    destination_prefix: String,
    target_fps: u32,
    work_dir: PathBuf,
    shutdown: watch::Receiver<bool>,
}

impl JobRunner {
    pub fn new(
        config: &WorkerConfig,
        store: Arc<dyn ObjectStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let (_, shutdown) = watch::channel(false);
        Self {
            store,
            transcoder,
            destination_prefix: config.destination_prefix.clone(),
            target_fps: config.target_fps,
            work_dir: config.work_dir.clone(),
            shutdown,
        }
    }

    /// Observe a shutdown signal between pipeline steps.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Process one source object. Never fails; errors become the outcome.
    pub async fn process(&self, source: &SourceObject) -> JobOutcome {
        let logger = JobLogger::new(&source.key, "transcode");
        let span = logger.create_span();

        async {
            let started = Instant::now();
            let destination = destination_key(&self.destination_prefix, &source.key);
            logger.log_start(&format!("{} -> {}", source.key, destination));

            let result = self.run_pipeline(source, &destination, &logger).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    logger.log_completion(&format!(
                        "uploaded {} in {} ms",
                        destination, duration_ms
                    ));
                    JobOutcome::success(&source.key, destination, duration_ms)
                }
                Err(e) => {
                    let stage = e.stage();
                    logger.log_error(stage.as_str(), &e.to_string());
                    JobOutcome::failure(&source.key, stage, e.to_string(), duration_ms)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Create staging, run the steps, and always clean up afterwards.
    async fn run_pipeline(
        &self,
        source: &SourceObject,
        destination: &str,
        logger: &JobLogger,
    ) -> Result<(), JobError> {
        let staging = StagingFiles::create(&self.work_dir, &source.key, source.extension.as_deref())
            .map_err(JobError::Staging)?;

        let result = self.run_steps(source, destination, &staging, logger).await;

        let dir = staging.dir().to_path_buf();
        if let Err(e) = staging.cleanup().await {
            logger.log_warning(&format!(
                "failed to remove staging dir {}: {}",
                dir.display(),
                e
            ));
        }

        result
    }

    async fn run_steps(
        &self,
        source: &SourceObject,
        destination: &str,
        staging: &StagingFiles,
        logger: &JobLogger,
    ) -> Result<(), JobError> {
        self.store
            .fetch(&source.key, staging.input())
            .await
            .map_err(JobError::Fetch)?;
        logger.log_progress("fetch", &format!("downloaded to {}", staging.input().display()));

        self.check_shutdown("transcode")?;
        self.transcoder
            .convert(staging.input(), staging.output(), self.target_fps)
            .await
            .map_err(JobError::Transcode)?;
        logger.log_progress("transcode", &format!("converted at {} fps", self.target_fps));

        self.check_shutdown("upload")?;
        self.store
            .put(staging.output(), destination)
            .await
            .map_err(JobError::Upload)?;

        Ok(())
    }

    fn check_shutdown(&self, next_step: &'static str) -> Result<(), JobError> {
        if *self.shutdown.borrow() {
            Err(JobError::Cancelled(next_step))
        } else {
            Ok(())
        }
    }
}
