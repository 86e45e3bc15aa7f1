//! Job runner pipeline tests.

mod common;

use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::watch;

use common::{shared, staging_entries, test_config, MemoryStore, ScriptedTranscoder, CORRUPT};
use vconvert_models::{FailureStage, OutcomeStatus, SourceObject};
use vconvert_worker::JobRunner;

#[tokio::test]
async fn test_successful_job_uploads_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 1);
    let store = shared(MemoryStore::new(100));
    let transcoder = Arc::new(ScriptedTranscoder::new());
    store.insert("raw/clip1.webm", b"webm-bytes");

    let runner = JobRunner::new(&config, store.clone(), transcoder.clone());
    let outcome = runner.process(&SourceObject::new("raw/clip1.webm", 10)).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.message, "processed");
    assert_eq!(outcome.destination_key.as_deref(), Some("converted_videos/clip1.mp4"));
    assert_eq!(
        store.get("converted_videos/clip1.mp4").as_deref(),
        Some(&b"mp4:webm-bytes"[..])
    );
    assert_eq!(transcoder.fps(), vec![24]);

    let (input, output) = transcoder.seen().remove(0);
    assert!(!input.exists());
    assert!(!output.exists());
    assert_eq!(output.extension().unwrap(), "mp4");
    assert_eq!(staging_entries(&config), 0);
}

#[tokio::test]
async fn test_fetch_failure_skips_upload() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 1);
    let store = shared(MemoryStore::new(100));
    let transcoder = Arc::new(ScriptedTranscoder::new());

    let runner = JobRunner::new(&config, store.clone(), transcoder.clone());
    let outcome = runner.process(&SourceObject::new("missing.webm", 0)).await;

    assert_eq!(outcome.status, OutcomeStatus::Failure);
    assert_eq!(outcome.stage, Some(FailureStage::Fetch));
    assert!(outcome.message.contains("Object not found: missing.webm"));
    assert!(transcoder.seen().is_empty());
    assert!(store.put_attempts().is_empty());
    assert_eq!(staging_entries(&config), 0);
}

#[tokio::test]
async fn test_transcode_failure_removes_partial_output() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 1);
    let store = shared(MemoryStore::new(100));
    let transcoder = Arc::new(ScriptedTranscoder::new());
    store.insert("broken.mkv", CORRUPT);

    let runner = JobRunner::new(&config, store.clone(), transcoder.clone());
    let outcome = runner.process(&SourceObject::new("broken.mkv", 7)).await;

    assert_eq!(outcome.stage, Some(FailureStage::Transcode));
    assert!(outcome.message.contains("exit code 1"));
    assert!(store.put_attempts().is_empty());
    assert!(!store.contains("converted_videos/broken.mp4"));

    let (input, output) = transcoder.seen().remove(0);
    assert!(!input.exists());
    assert!(!output.exists());
    assert_eq!(staging_entries(&config), 0);
}

#[tokio::test]
async fn test_upload_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 1);
    let store = shared(MemoryStore::new(100));
    store.insert("clip.avi", b"avi");
    store.deny_put("converted_videos/clip.mp4");

    let runner = JobRunner::new(&config, store.clone(), Arc::new(ScriptedTranscoder::new()));
    let outcome = runner.process(&SourceObject::new("clip.avi", 3)).await;

    assert_eq!(outcome.stage, Some(FailureStage::Upload));
    assert!(outcome.message.starts_with("upload failed: Access denied"));
    assert_eq!(store.put_attempts(), vec!["converted_videos/clip.mp4".to_string()]);
    assert_eq!(staging_entries(&config), 0);
}

#[tokio::test]
async fn test_shutdown_stops_between_steps() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 1);
    let store = shared(MemoryStore::new(100));
    let transcoder = Arc::new(ScriptedTranscoder::new());
    store.insert("clip.webm", b"webm");

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let runner = JobRunner::new(&config, store.clone(), transcoder.clone()).with_shutdown(rx);
    let outcome = runner.process(&SourceObject::new("clip.webm", 4)).await;

    // The fetch in progress completes, nothing after it starts.
    assert_eq!(outcome.stage, Some(FailureStage::Cancelled));
    assert_eq!(store.fetched(), vec!["clip.webm".to_string()]);
    assert!(transcoder.seen().is_empty());
    assert!(store.put_attempts().is_empty());
    assert_eq!(staging_entries(&config), 0);
}

#[tokio::test]
async fn test_same_basename_in_different_prefixes() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 2);
    let store = shared(MemoryStore::new(100));
    let transcoder = Arc::new(ScriptedTranscoder::new());
    store.insert("a/clip.webm", b"first");
    store.insert("b/clip.webm", b"second");

    let runner = JobRunner::new(&config, store.clone(), transcoder.clone());
    let a = SourceObject::new("a/clip.webm", 5);
    let b = SourceObject::new("b/clip.webm", 6);
    let (first, second) = tokio::join!(runner.process(&a), runner.process(&b));

    assert!(first.is_success());
    assert!(second.is_success());

    let seen = transcoder.seen();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].0, seen[1].0);
    assert_ne!(seen[0].1, seen[1].1);
    assert_eq!(staging_entries(&config), 0);
}
