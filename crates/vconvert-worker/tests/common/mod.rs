//! In-memory collaborators for worker tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use vconvert_media::{MediaError, MediaResult, Transcoder};
use vconvert_models::ExtensionFilter;
use vconvert_storage::{ListPage, ObjectInfo, ObjectStore, StorageError, StorageResult};
use vconvert_worker::WorkerConfig;

/// Input bytes that make [`ScriptedTranscoder`] exit with an error.
pub const CORRUPT: &[u8] = b"corrupt";
/// Input bytes that make [`ScriptedTranscoder`] panic.
pub const POISON: &[u8] = b"poison";

/// Bucket held in memory, listed in key order `page_size` keys at a time.
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
    delay: Duration,
    fail_listing: AtomicBool,
    deny_puts: Mutex<HashSet<String>>,
    list_calls: Mutex<Vec<Option<String>>>,
    fetched: Mutex<Vec<String>>,
    put_attempts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            delay: Duration::ZERO,
            fail_listing: AtomicBool::new(false),
            deny_puts: Mutex::new(HashSet::new()),
            list_calls: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
            put_attempts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every fetch and put.
    ///
    /// Concurrent fetches are tracked, so with a delay the high-water mark
    /// reflects how many jobs the pool ran at once.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    pub fn deny_put(&self, key: &str) {
        self.deny_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn put_attempts(&self) -> Vec<String> {
        self.put_attempts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<String>,
    ) -> StorageResult<ListPage> {
        self.list_calls.lock().unwrap().push(continuation.clone());

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StorageError::access_denied("list bucket"));
        }

        let start: usize = match continuation {
            Some(token) => token
                .parse()
                .map_err(|_| StorageError::transport("bad continuation token"))?,
            None => 0,
        };

        let matching: Vec<ObjectInfo> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .map(|(key, bytes)| ObjectInfo::new(key.clone(), bytes.len() as u64))
            .collect();

        let end = (start + self.page_size).min(matching.len());
        let objects = matching.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_continuation = if end < matching.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(ListPage {
            objects,
            next_continuation,
        })
    }

    async fn fetch(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(active, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(key.to_string());

        self.pause().await;

        let bytes = self.get(key);
        let result = match bytes {
            Some(bytes) => tokio::fs::write(local_path, bytes).await.map_err(StorageError::from),
            None => Err(StorageError::not_found(key)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn put(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        self.put_attempts.lock().unwrap().push(key.to_string());
        self.pause().await;

        if self.deny_puts.lock().unwrap().contains(key) {
            return Err(StorageError::access_denied(format!("put {}", key)));
        }

        let bytes = tokio::fs::read(local_path).await?;
        self.insert(key, &bytes);
        Ok(())
    }
}

/// Store whose listing hands out scripted continuation tokens.
///
/// `next` maps the token a page was requested with to the token it returns;
/// every page holds one eligible object.
pub struct ScriptedListing {
    next: Vec<(Option<&'static str>, Option<&'static str>)>,
    calls: AtomicUsize,
}

impl ScriptedListing {
    pub fn new(next: Vec<(Option<&'static str>, Option<&'static str>)>) -> Self {
        Self {
            next,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for ScriptedListing {
    async fn list_page(
        &self,
        _prefix: Option<&str>,
        continuation: Option<String>,
    ) -> StorageResult<ListPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .next
            .iter()
            .find(|(from, _)| from.map(str::to_string) == continuation)
            .and_then(|(_, to)| to.map(str::to_string));

        Ok(ListPage {
            objects: vec![ObjectInfo::new(format!("page{}.mp4", call), 1)],
            next_continuation: next,
        })
    }

    async fn fetch(&self, key: &str, _local_path: &Path) -> StorageResult<()> {
        Err(StorageError::not_found(key))
    }

    async fn put(&self, _local_path: &Path, key: &str) -> StorageResult<()> {
        Err(StorageError::access_denied(key))
    }
}

/// Transcoder that copies its input with a marker, fails on [`CORRUPT`]
/// input and panics on [`POISON`] input. Remembers every path it saw.
#[derive(Default)]
pub struct ScriptedTranscoder {
    seen: Mutex<Vec<(PathBuf, PathBuf)>>,
    fps: Mutex<Vec<u32>>,
}

impl ScriptedTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<(PathBuf, PathBuf)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn fps(&self) -> Vec<u32> {
        self.fps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn convert(&self, input: &Path, output: &Path, target_fps: u32) -> MediaResult<()> {
        self.seen
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        self.fps.lock().unwrap().push(target_fps);

        let bytes = tokio::fs::read(input).await?;
        if bytes == POISON {
            panic!("transcoder crashed on {}", input.display());
        }
        if bytes == CORRUPT {
            // Leave a partial output behind, as a real tool would.
            tokio::fs::write(output, b"partial").await?;
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid data found when processing input".to_string()),
                Some(1),
            ));
        }

        let mut converted = b"mp4:".to_vec();
        converted.extend_from_slice(&bytes);
        tokio::fs::write(output, converted).await?;
        Ok(())
    }
}

/// Config pointing at a fresh staging root.
pub fn test_config(work_dir: &TempDir, worker_count: usize) -> WorkerConfig {
    WorkerConfig {
        destination_prefix: "converted_videos".to_string(),
        accepted_extensions: ExtensionFilter::default(),
        worker_count,
        work_dir: work_dir.path().join("staging"),
        ..WorkerConfig::default()
    }
}

/// Number of entries left in the staging root (0 if it was never created).
pub fn staging_entries(config: &WorkerConfig) -> usize {
    match std::fs::read_dir(&config.work_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

pub fn shared(store: MemoryStore) -> Arc<MemoryStore> {
    Arc::new(store)
}
