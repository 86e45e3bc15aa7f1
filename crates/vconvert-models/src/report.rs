//! Aggregate report for one batch run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::outcome::{JobOutcome, OutcomeStatus};

/// Unique identifier for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All outcomes of one invocation.
///
/// Outcomes are kept in completion order; no ordering across jobs is implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    /// Seal a report once every job has produced its outcome.
    pub fn new(run_id: RunId, started_at: DateTime<Utc>, outcomes: Vec<JobOutcome>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(OutcomeStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::Failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Outcome recorded for `key`, if any.
    pub fn outcome_for(&self, key: &str) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    /// Final count line printed after the per-item lines.
    pub fn summary(&self) -> String {
        format!(
            "Summary: {} objects, {} succeeded, {} failed ({} ms)",
            self.total(),
            self.succeeded(),
            self.failed(),
            self.elapsed_ms()
        )
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0)
    }

    fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
