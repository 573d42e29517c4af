use axum::extract::FromRef;

use crate::entry_store::LocalEntryStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedEntryStore = Arc<LocalEntryStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub entry_store: GuardedEntryStore,
}

impl ServerState {
    pub fn new(config: ServerConfig, entry_store: LocalEntryStore) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            entry_store: Arc::new(entry_store),
        }
    }
}

impl FromRef<ServerState> for GuardedEntryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.entry_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
