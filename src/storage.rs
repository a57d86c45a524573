//! Scoped on-disk storage for uploaded videos.
//!
//! Each upload gets its own temporary directory under the upload root. The
//! directory and everything in it is removed when the [`TempUpload`] is
//! dropped, whether processing succeeded, failed or panicked.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh directory for one upload. `file_name` is the name the
    /// client sent; only its extension is kept.
    pub async fn begin(&self, file_name: Option<&str>) -> io::Result<TempUpload> {
        tokio::fs::create_dir_all(&self.root).await?;

        let dir = tempfile::Builder::new()
            .prefix("upload_")
            .tempdir_in(&self.root)?;
        let path = dir.path().join(format!("input.{}", extension(file_name)));
        let file = tokio::fs::File::create(&path).await?;

        Ok(TempUpload {
            dir,
            path,
            file: Some(file),
            bytes: 0,
        })
    }
}

/// An upload being written to, or already written to, scoped storage.
#[derive(Debug)]
pub struct TempUpload {
    dir: TempDir,
    path: PathBuf,
    file: Option<tokio::fs::File>,
    bytes: u64,
}

impl TempUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("upload already finished"))?;
        file.write_all(chunk).await?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the file so it can be reopened for decoding.
    pub async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Remove the upload now, logging rather than failing on error.
    pub fn remove(self) {
        let dir = self.dir.path().to_path_buf();
        drop(self.file);
        if let Err(e) = self.dir.close() {
            tracing::warn!(path = %dir.display(), "failed to remove upload: {}", e);
        }
    }
}

fn extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
