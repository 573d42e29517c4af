//! Set of previously used tags, persisted across sessions.

use super::kv_store::{InMemoryKeyValueStore, KeyValueStore};
use crate::entry::TagList;
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Storage key of the serialized tag list.
pub const USED_TAGS_KEY: &str = "usedTags";

/// Suggestions offered before anything has been typed.
pub const DEFAULT_TAGS: &[&str] = &["basic step", "turn", "shine", "footwork", "partnerwork"];

/// Tags used on any entry, unioned with built-in defaults. Never shrinks.
///
/// Every [`TagMemory::remember`] writes the whole set back immediately; the
/// store is shared with other sessions and the last writer wins.
pub struct TagMemory {
    store: Arc<dyn KeyValueStore>,
    defaults: TagList,
    tags: Mutex<TagList>,
}

impl TagMemory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_defaults(store, DEFAULT_TAGS.iter().copied().collect())
    }

    pub fn with_defaults(store: Arc<dyn KeyValueStore>, defaults: TagList) -> Self {
        let memory = Self {
            store,
            defaults,
            tags: Mutex::new(TagList::new()),
        };
        let loaded = memory.read_persisted();
        *memory.tags.lock().unwrap() = loaded;
        memory
    }

    /// Non persistent memory, no defaults.
    pub fn in_memory() -> Self {
        Self::with_defaults(Arc::new(InMemoryKeyValueStore::default()), TagList::new())
    }

    /// Persisted tags unioned with the defaults.
    pub fn load(&self) -> TagList {
        self.tags.lock().unwrap().clone()
    }

    /// Unions `tags` into the set and persists the result.
    ///
    /// The in-memory set only changes once the write succeeded, so a failed
    /// save is retried by the next call with the same tags.
    pub fn remember(&self, tags: &TagList) -> Result<()> {
        let mut current = self.tags.lock().unwrap();
        let mut updated = current.clone();
        let mut changed = false;
        for tag in tags {
            changed |= updated.insert(tag);
        }
        if !changed {
            return Ok(());
        }
        let serialized = serde_json::to_string(updated.as_slice())?;
        self.store
            .save(USED_TAGS_KEY, &serialized)
            .context("Failed to save used tags")?;
        *current = updated;
        debug!("Remembered tags, now {} known", current.len());
        Ok(())
    }

    fn read_persisted(&self) -> TagList {
        let mut tags = match self.store.load(USED_TAGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw)
                .map(TagList::from)
                .unwrap_or_else(|e| {
                    warn!("Malformed used tags value {}: {}", raw, e);
                    TagList::new()
                }),
            Ok(None) => TagList::new(),
            Err(e) => {
                warn!("Failed to load used tags: {:#}", e);
                TagList::new()
            }
        };
        for tag in &self.defaults {
            tags.insert(tag);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::SqliteKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` saves, then delegates to memory.
    #[derive(Default)]
    struct FlakyStore {
        failures: AtomicUsize,
        inner: InMemoryKeyValueStore,
    }

    impl KeyValueStore for FlakyStore {
        fn load(&self, key: &str) -> Result<Option<String>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> Result<()> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("disk full");
            }
            self.inner.save(key, value)
        }
    }

    #[test]
    fn remember_is_idempotent() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        let memory = TagMemory::with_defaults(store.clone(), TagList::new());
        let step: TagList = ["step"].into_iter().collect();

        memory.remember(&step).unwrap();
        memory.remember(&step).unwrap();

        let persisted: Vec<String> =
            serde_json::from_str(&store.load(USED_TAGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, vec!["step".to_string()]);
        assert_eq!(memory.load().len(), 1);
    }

    #[test]
    fn failed_save_is_retried_by_next_remember() {
        let store = Arc::new(FlakyStore {
            failures: AtomicUsize::new(1),
            ..Default::default()
        });
        let memory = TagMemory::with_defaults(store.clone(), TagList::new());
        let step: TagList = ["step"].into_iter().collect();

        assert!(memory.remember(&step).is_err());
        assert!(memory.load().is_empty());
        assert_eq!(store.load(USED_TAGS_KEY).unwrap(), None);

        memory.remember(&step).unwrap();
        assert_eq!(
            store.load(USED_TAGS_KEY).unwrap().as_deref(),
            Some(r#"["step"]"#)
        );
        assert!(memory.load().contains("step"));
    }

    #[test]
    fn load_merges_defaults_with_persisted_tags() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        store.save(USED_TAGS_KEY, r#"["dips","turn"]"#).unwrap();

        let memory = TagMemory::new(store);
        let tags = memory.load();
        assert_eq!(tags.as_slice()[0], "dips");
        assert!(tags.contains("turn"));
        assert!(tags.contains("basic step"));
        assert_eq!(tags.len(), 1 + DEFAULT_TAGS.len());
    }

    #[test]
    fn malformed_value_falls_back_to_defaults() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        store.save(USED_TAGS_KEY, "not json").unwrap();
        let memory = TagMemory::new(store);
        assert_eq!(memory.load().len(), DEFAULT_TAGS.len());
    }

    #[test]
    fn survives_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.db");
        {
            let store = Arc::new(SqliteKeyValueStore::new(&path).unwrap());
            let memory = TagMemory::with_defaults(store, TagList::new());
            memory
                .remember(&["copa", "setenta"].into_iter().collect())
                .unwrap();
        }
        let store = Arc::new(SqliteKeyValueStore::new(&path).unwrap());
        let memory = TagMemory::with_defaults(store, TagList::new());
        assert_eq!(
            memory.load().as_slice(),
            &["copa".to_string(), "setenta".to_string()]
        );
    }
}
