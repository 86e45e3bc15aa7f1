//! S3-compatible object storage gateway.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait the batch worker is written against
//! - Paged bucket listing, download to file, upload from file
//! - Retry with exponential backoff for transport failures

pub mod client;
pub mod error;
pub mod gateway;
pub mod retry;

pub use client::{oci_endpoint, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use gateway::{ListPage, ObjectInfo, ObjectStore};
pub use retry::{with_retry, RetryConfig};
