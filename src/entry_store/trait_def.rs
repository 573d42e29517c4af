//! EntryStore trait definition.

use super::models::{BlobKind, EntryRecord, StoreError};
use crate::entry::SubmittableEntry;
use async_trait::async_trait;
use tracing::debug;

/// Remote document + blob store holding submitted entries.
///
/// Implementations classify every failure as [`StoreError::Duplicate`],
/// [`StoreError::DuplicateFile`] or [`StoreError::Fatal`]; callers never
/// inspect error messages.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Whether an entry with this title is already stored.
    async fn exists(&self, title: &str) -> Result<bool, StoreError>;

    /// Stores a media blob and returns its key.
    ///
    /// Keys are unique per call even for equal names; a key that cannot be
    /// written fresh is a [`StoreError::DuplicateFile`], never an overwrite.
    async fn put_blob(
        &self,
        kind: BlobKind,
        data: &[u8],
        suggested_name: &str,
    ) -> Result<String, StoreError>;

    /// Writes a record, unique on its title.
    async fn put_entry(&self, record: &EntryRecord) -> Result<(), StoreError>;

    /// Stores one entry with its two blobs and returns the new entry id.
    ///
    /// Blobs written before a failing `put_entry` are not rolled back.
    async fn upload(&self, entry: SubmittableEntry<'_>) -> Result<String, StoreError> {
        if self.exists(entry.title).await? {
            return Err(StoreError::Duplicate(entry.title.to_string()));
        }
        let video_key = self
            .put_blob(BlobKind::Video, &entry.video.data, &entry.video.file_name)
            .await?;
        let thumbnail_key = self
            .put_blob(
                BlobKind::Thumbnail,
                &entry.thumbnail.data,
                &entry.thumbnail.file_name,
            )
            .await?;
        let record = EntryRecord::new(entry, video_key, thumbnail_key);
        self.put_entry(&record).await?;
        debug!("Stored entry {} as {}", record.title, record.id);
        Ok(record.id)
    }
}
