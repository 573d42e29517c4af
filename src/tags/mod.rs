//! Previously used tags, remembered across sessions.

mod kv_store;
mod tag_memory;

pub use kv_store::{InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore};
pub use tag_memory::{TagMemory, DEFAULT_TAGS, USED_TAGS_KEY};
