//! Where submitted entries end up: a document store for records plus a blob
//! store for media, behind the [`EntryStore`] trait.

mod blob_store;
mod http_store;
mod local_store;
mod models;
mod schema;
mod sqlite_store;
mod trait_def;

pub use blob_store::{sanitize_filename, BlobStoreError, FsBlobStore};
pub use http_store::HttpEntryStore;
pub use local_store::LocalEntryStore;
pub use models::*;
pub use schema::ENTRIES_VERSIONED_SCHEMAS;
pub use sqlite_store::SqliteEntryStore;
pub use trait_def::EntryStore;
