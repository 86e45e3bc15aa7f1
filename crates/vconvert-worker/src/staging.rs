//! Per-job staging files.
//!
//! Each job gets a private directory under the work dir holding its
//! downloaded input and transcoded output. The directory name starts with a
//! label derived from the full object key and ends with a random suffix, so
//! two jobs never share a path even when their keys share a basename.
//!
//! The directory is removed by [`StagingFiles::cleanup`] on every normal exit
//! path. If the owning task panics or is dropped mid-step, the `TempDir`
//! guard removes it instead.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vconvert_models::{staging_label, OUTPUT_EXTENSION};

/// Longest key-derived label used in a directory name.
const MAX_LABEL_CHARS: usize = 64;

#[derive(Debug)]
pub struct StagingFiles {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl StagingFiles {
    /// Create the staging directory for `key` under `root`.
    pub fn create(root: &Path, key: &str, extension: Option<&str>) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;

        let label: String = staging_label(key).chars().take(MAX_LABEL_CHARS).collect();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", label))
            .tempdir_in(root)?;

        let input_name = match extension {
            Some(ext) => format!("input.{}", ext),
            None => "input".to_string(),
        };
        let input = dir.path().join(input_name);
        let output = dir.path().join(format!("output.{}", OUTPUT_EXTENSION));

        Ok(Self { dir, input, output })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove both staging files and the directory.
    pub async fn cleanup(self) -> io::Result<()> {
        remove_if_exists(&self.input).await?;
        remove_if_exists(&self.output).await?;
        self.dir.close()
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
