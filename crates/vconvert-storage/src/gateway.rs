//! Object store abstraction used by the batch worker.
//!
//! The worker only ever talks to storage through [`ObjectStore`], which keeps
//! the orchestration logic independent of the S3 SDK and lets tests swap in
//! an in-memory store.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Information about a listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
}

impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectInfo>,
    /// Token for the next page; `None` once the listing is exhausted
    pub next_continuation: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next_continuation.is_none()
    }
}

/// List, fetch and put operations against one bucket.
///
/// Implementations must be safe to call concurrently from many jobs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List a single page of objects, optionally restricted to `prefix`.
    ///
    /// Callers are responsible for following `next_continuation` until it is
    /// `None`; one page is never assumed to be the whole bucket.
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<String>,
    ) -> StorageResult<ListPage>;

    /// Download `key` into `local_path`, creating parent directories.
    async fn fetch(&self, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Upload `local_path` to `key`, overwriting any existing object.
    async fn put(&self, local_path: &Path, key: &str) -> StorageResult<()>;
}
