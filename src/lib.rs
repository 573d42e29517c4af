//! Dance Vocab Uploader Library
//!
//! Multi-entry dance move uploads: draft entries, tag memory, media editing,
//! the sequential upload pipeline and the entry stores it talks to.

pub mod config;
pub mod entry;
pub mod entry_store;
pub mod media;
pub mod pipeline;
pub mod server;
pub mod sqlite_persistence;
pub mod tags;

// Re-export commonly used types for convenience
pub use entry::{Entry, EntryCollection};
pub use entry_store::{EntryStore, HttpEntryStore, LocalEntryStore, StoreError};
pub use pipeline::{PipelineError, UploadOutcome, UploadPipeline};
pub use server::{run_server, RequestsLoggingLevel};
pub use tags::TagMemory;
