//! Local disk storage for uploaded book files
//!
//! Uploads are streamed to disk chunk by chunk while their SHA-256 checksum
//! and size are computed, so a file is never held in memory as a whole.
//! Downloads stream the stored bytes back in `chunk_size` pieces.

use anyhow::{Context, Result};
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::StorageConfig;

/// File written by [`FileStore::save_stream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub file_type: String,
    pub size: u64,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    chunk_size: usize,
    max_upload_bytes: usize,
}

impl FileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            chunk_size: config.chunk_size.max(1),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Create the storage directory if it does not exist yet
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create storage directory {}", self.root.display()))?;
        info!(root = %self.root.display(), "File storage ready");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Stream an upload to disk under a generated name
    ///
    /// The original file name only contributes its extension. Data goes to a
    /// `.part` file first and is renamed into place once complete; on any
    /// error the partial file is removed.
    #[instrument(skip(self, stream))]
    pub async fn save_stream<S, E>(&self, file_name: &str, stream: S) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.init().await?;

        let file_type = file_type_of(file_name);
        let stem = Uuid::new_v4().to_string();
        let final_name = if file_type.is_empty() {
            stem.clone()
        } else {
            format!("{stem}.{file_type}")
        };
        let partial = self.root.join(format!("{stem}.part"));
        let path = self.root.join(final_name);

        match self.write_stream(&partial, stream).await {
            Ok((size, checksum)) => {
                fs::rename(&partial, &path)
                    .await
                    .with_context(|| format!("Failed to move upload into {}", path.display()))?;

                info!(path = %path.display(), size, "Stored uploaded file");
                Ok(StoredFile {
                    path,
                    file_type,
                    size,
                    checksum,
                })
            },
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            },
        }
    }

    async fn write_stream<S, E>(&self, target: &Path, stream: S) -> Result<(u64, String)>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let file = File::create(target)
            .await
            .with_context(|| format!("Failed to create {}", target.display()))?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        let mut stream = std::pin::pin!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read upload stream")?;
            for piece in chunk.chunks(self.chunk_size) {
                hasher.update(piece);
                writer.write_all(piece).await?;
            }
            size += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        let checksum = format!("{:x}", hasher.finalize());
        debug!(size, %checksum, "Upload stream written");
        Ok((size, checksum))
    }

    /// Open a stored file as a stream of `chunk_size` pieces
    #[instrument(skip(self))]
    pub async fn open(&self, path: &Path) -> Result<ReaderStream<File>> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open stored file {}", path.display()))?;
        Ok(ReaderStream::with_capacity(file, self.chunk_size))
    }

    /// Delete a stored file; a missing file is not an error
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            },
            _ => Ok(()),
        }
    }

    /// Best-effort removal of files whose rows are already gone
    ///
    /// Failures are logged and skipped. Returns how many were removed.
    pub async fn remove_all<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        let mut removed = 0;
        for path in paths {
            match self.remove(path.as_ref()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(error = %e, "Leaving orphaned file on disk"),
            }
        }
        removed
    }
}

/// Lowercased extension of `file_name` without the dot, or empty
pub fn file_type_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
