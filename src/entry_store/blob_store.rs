//! Filesystem object store for entry media.

use super::models::BlobKind;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blobs live under `root/<kind dir>/<unix millis>-<nonce>-<sanitized name>`.
///
/// The random nonce keeps keys distinct when many files share a name, as
/// every edited video and thumbnail does.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the kind directories.
    pub async fn init(&self) -> Result<(), BlobStoreError> {
        for kind in [BlobKind::Video, BlobKind::Thumbnail] {
            tokio::fs::create_dir_all(self.root.join(kind.dir_name())).await?;
        }
        info!("Blob store ready at {:?}", self.root);
        Ok(())
    }

    /// Key a blob named `name` gets when written at `millis` with `nonce`.
    pub fn make_key(
        kind: BlobKind,
        millis: i64,
        nonce: &str,
        name: &str,
    ) -> Result<String, BlobStoreError> {
        let name = sanitize_filename(name)?;
        Ok(format!("{}/{}-{}-{}", kind.dir_name(), millis, nonce, name))
    }

    /// Writes a new blob and returns its key. Never overwrites.
    ///
    /// A key that happens to be taken is retried with a fresh nonce.
    pub async fn put(
        &self,
        kind: BlobKind,
        data: &[u8],
        suggested_name: &str,
    ) -> Result<String, BlobStoreError> {
        let mut attempt = 0;
        loop {
            let key = Self::make_key(
                kind,
                chrono::Utc::now().timestamp_millis(),
                &new_nonce(),
                suggested_name,
            )?;
            match self.put_at(&key, data).await {
                Ok(()) => return Ok(key),
                Err(BlobStoreError::AlreadyExists(taken)) if attempt < MAX_KEY_ATTEMPTS => {
                    debug!("Blob key {} taken, retrying", taken);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub(crate) async fn put_at(&self, key: &str, data: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobStoreError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(data).await?;
        file.flush().await?;
        debug!("Wrote blob {} ({} bytes)", key, data.len());
        Ok(())
    }

    /// Reads the blob under `key`, if any.
    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a key to its path, rejecting anything outside the kind directories.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let invalid = || BlobStoreError::InvalidName(key.to_string());
        let (dir, name) = key.split_once('/').ok_or_else(invalid)?;
        let kind = BlobKind::from_dir_name(dir).ok_or_else(invalid)?;
        if sanitize_filename(name)? != name {
            return Err(invalid());
        }
        Ok(self.root.join(kind.dir_name()).join(name))
    }
}

const MAX_KEY_ATTEMPTS: usize = 3;

fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Strips any path from `filename` and replaces characters unsafe on common filesystems.
pub fn sanitize_filename(filename: &str) -> Result<String, BlobStoreError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BlobStoreError::InvalidName(filename.to_string()))?;

    // Null bytes, hidden files and ".." never make it to disk.
    if name.contains('\0') || name.starts_with('.') || name == ".." {
        return Err(BlobStoreError::InvalidName(filename.to_string()));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            _ => c,
        })
        .collect();

    if sanitized.is_empty() {
        return Err(BlobStoreError::InvalidName(filename.to_string()));
    }
    Ok(sanitized)
}
