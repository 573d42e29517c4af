use super::blob_store::{BlobStoreError, FsBlobStore};
use super::models::{BlobKind, EntryRecord, StoreError};
use super::sqlite_store::SqliteEntryStore;
use super::trait_def::EntryStore;
use async_trait::async_trait;
use tracing::warn;

/// [`EntryStore`] over a local SQLite document store and a filesystem blob store.
#[derive(Clone)]
pub struct LocalEntryStore {
    records: SqliteEntryStore,
    blobs: FsBlobStore,
}

impl LocalEntryStore {
    pub fn new(records: SqliteEntryStore, blobs: FsBlobStore) -> Self {
        Self { records, blobs }
    }

    pub fn records(&self) -> &SqliteEntryStore {
        &self.records
    }

    pub fn blobs(&self) -> &FsBlobStore {
        &self.blobs
    }
}

#[async_trait]
impl EntryStore for LocalEntryStore {
    async fn exists(&self, title: &str) -> Result<bool, StoreError> {
        self.records.title_exists(title).map_err(|e| {
            warn!("Title lookup failed: {:#}", e);
            StoreError::fatal(format!("{:#}", e))
        })
    }

    async fn put_blob(
        &self,
        kind: BlobKind,
        data: &[u8],
        suggested_name: &str,
    ) -> Result<String, StoreError> {
        self.blobs
            .put(kind, data, suggested_name)
            .await
            .map_err(|e| match e {
                BlobStoreError::AlreadyExists(_) => {
                    StoreError::DuplicateFile(suggested_name.to_string())
                }
                other => StoreError::fatal(other),
            })
    }

    async fn put_entry(&self, record: &EntryRecord) -> Result<(), StoreError> {
        match self.records.insert(record) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::Duplicate(record.title.clone())),
            Err(e) => {
                warn!("Failed to store entry {}: {:#}", record.title, e);
                Err(StoreError::fatal(format!("{:#}", e)))
            }
        }
    }
}
