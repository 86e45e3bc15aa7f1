//! Shared data models for the vconvert batch transcoder.
//!
//! This crate provides Serde-serializable types for:
//! - Source objects discovered in a bucket listing
//! - Per-job outcomes and the aggregate run report
//! - The accepted-extension filter
//! - Object key conventions (destination keys, staging labels)

pub mod filter;
pub mod keys;
pub mod object;
pub mod outcome;
pub mod report;

// Re-export common types
pub use filter::{ExtensionFilter, DEFAULT_EXTENSIONS};
pub use keys::{basename, destination_key, staging_label, OUTPUT_EXTENSION};
pub use object::SourceObject;
pub use outcome::{FailureStage, JobOutcome, OutcomeStatus, SUCCESS_MESSAGE};
pub use report::{RunId, RunReport};
