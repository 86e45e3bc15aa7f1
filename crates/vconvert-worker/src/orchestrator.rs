//! Batch orchestrator.
//!
//! Discovers every eligible object (following listing pages until the store
//! reports no continuation), dispatches one [`JobRunner`] invocation per
//! object onto a pool of `worker_count` slots, and collects exactly one
//! outcome per dispatched object into a [`RunReport`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, info_span, warn, Instrument};

use vconvert_media::Transcoder;
use vconvert_models::{
    destination_key, ExtensionFilter, FailureStage, JobOutcome, RunId, RunReport, SourceObject,
};
use vconvert_storage::ObjectStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::job_runner::JobRunner;

pub struct Orchestrator {
    store: Arc<dyn ObjectStore>,
    runner: JobRunner,
    source_prefix: Option<String>,
    destination_prefix: String,
    worker_count: usize,
    shutdown: watch::Receiver<bool>,
}

impl Orchestrator {
    /// Create an orchestrator from configuration and its two collaborators.
    pub fn new(
        config: &WorkerConfig,
        store: Arc<dyn ObjectStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let runner = JobRunner::new(config, Arc::clone(&store), transcoder);
        let (_, shutdown) = watch::channel(false);

        Self {
            store,
            runner,
            source_prefix: config.source_prefix.clone(),
            destination_prefix: config.destination_prefix.trim_end_matches('/').to_string(),
            worker_count: config.worker_count.max(1),
            shutdown,
        }
    }

    /// Stop dispatching new jobs once `shutdown` flips to `true`.
    ///
    /// Jobs that already started finish their current step and clean up.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.runner = self.runner.with_shutdown(shutdown.clone());
        self.shutdown = shutdown;
        self
    }

    /// Run one batch.
    ///
    /// Fails only if discovery fails; per-object failures are reported in
    /// the returned report.
    pub async fn run(&self, filter: &ExtensionFilter) -> WorkerResult<RunReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let span = info_span!("run", run_id = %run_id);

        async {
            let sources = self.discover(filter).await?;
            info!(
                "Discovered {} objects, dispatching with {} workers",
                sources.len(),
                self.worker_count
            );

            let outcomes = self.dispatch(sources).await;
            let report = RunReport::new(run_id.clone(), started_at, outcomes);

            info!(
                total = report.total(),
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Run finished"
            );
            Ok::<_, WorkerError>(report)
        }
        .instrument(span)
        .await
    }

    /// List the bucket page by page and keep eligible keys.
    ///
    /// Keys already under the destination prefix are skipped so converted
    /// outputs are never picked up again as sources.
    pub async fn discover(&self, filter: &ExtensionFilter) -> WorkerResult<Vec<SourceObject>> {
        let mut sources = Vec::new();
        let mut seen = HashSet::new();
        let mut tokens: HashSet<String> = HashSet::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;
        let mut ineligible = 0usize;
        let mut outputs = 0usize;

        loop {
            let page = self
                .store
                .list_page(self.source_prefix.as_deref(), continuation.clone())
                .await
                .map_err(WorkerError::Discovery)?;
            pages += 1;

            for object in page.objects {
                if !filter.accepts(&object.key) {
                    ineligible += 1;
                    continue;
                }
                if self.is_output_key(&object.key) {
                    outputs += 1;
                    continue;
                }
                if seen.insert(object.key.clone()) {
                    sources.push(SourceObject::new(object.key, object.size));
                }
            }

            // A token seen before means the listing has looped.
            match page.next_continuation {
                Some(token) if !tokens.insert(token.clone()) => {
                    return Err(WorkerError::ListingStalled(format!(
                        "continuation token {:?} repeated after {} pages",
                        token, pages
                    )));
                }
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        debug!(
            pages,
            eligible = sources.len(),
            ineligible,
            outputs,
            "Discovery complete"
        );
        self.warn_on_collisions(&sources);

        Ok(sources)
    }

    /// Run every job on the bounded pool and collect outcomes as they finish.
    async fn dispatch(&self, sources: Vec<SourceObject>) -> Vec<JobOutcome> {
        let total = sources.len();
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let runner = Arc::new(self.runner.clone());

        let mut pending: FuturesUnordered<_> = sources
            .into_iter()
            .map(|source| {
                let key = source.key.clone();
                let runner = Arc::clone(&runner);
                let semaphore = Arc::clone(&semaphore);
                let shutdown = self.shutdown.clone();

                let handle = tokio::spawn(
                    async move {
                        let _permit = match semaphore.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => {
                                return JobOutcome::failure(
                                    source.key,
                                    FailureStage::Aborted,
                                    "worker pool closed",
                                    0,
                                )
                            }
                        };

                        if *shutdown.borrow() {
                            return JobOutcome::failure(
                                source.key,
                                FailureStage::Cancelled,
                                "cancelled by shutdown before start",
                                0,
                            );
                        }

                        runner.process(&source).await
                    }
                    .in_current_span(),
                );

                async move { (key, handle.await) }
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);

        while let Some((key, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let cause = if e.is_panic() {
                        "job task panicked"
                    } else {
                        "job task was cancelled"
                    };
                    JobOutcome::failure(key, FailureStage::Aborted, cause, 0)
                }
            };

            log_outcome(&outcome, outcomes.len() + 1, total);
            outcomes.push(outcome);
        }

        outcomes
    }

    fn is_output_key(&self, key: &str) -> bool {
        !self.destination_prefix.is_empty()
            && key
                .strip_prefix(self.destination_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Distinct sources that map to the same destination overwrite each other.
    fn warn_on_collisions(&self, sources: &[SourceObject]) {
        let mut by_destination: HashMap<String, Vec<&str>> = HashMap::new();
        for source in sources {
            by_destination
                .entry(destination_key(&self.destination_prefix, &source.key))
                .or_default()
                .push(&source.key);
        }

        for (destination, keys) in by_destination.iter().filter(|(_, keys)| keys.len() > 1) {
            warn!(
                destination = %destination,
                sources = ?keys,
                "Multiple sources map to the same destination; the last upload wins"
            );
        }
    }
}

fn log_outcome(outcome: &JobOutcome, completed: usize, total: usize) {
    if outcome.is_success() {
        info!(
            key = %outcome.key,
            destination = outcome.destination_key.as_deref().unwrap_or_default(),
            completed,
            total,
            "{}", outcome
        );
    } else {
        warn!(
            key = %outcome.key,
            stage = outcome.stage.map(|s| s.as_str()).unwrap_or_default(),
            completed,
            total,
            "{}", outcome
        );
    }
}
