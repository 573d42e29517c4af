//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own entries database and media
//! directory.

use super::constants::*;
use dance_vocab_uploader::entry_store::{FsBlobStore, LocalEntryStore, SqliteEntryStore};
use dance_vocab_uploader::media::MediaLimits;
use dance_vocab_uploader::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Direct access to what the server stored
    pub store: LocalEntryStore,

    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with default media limits on a random port.
    pub async fn spawn() -> Self {
        Self::spawn_with_limits(MediaLimits::default()).await
    }

    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn_with_limits(limits: MediaLimits) -> Self {
        Self::spawn_inner(limits, false).await
    }

    /// Spawns a server serving an empty frontend directory at `/`, so only
    /// the `/api` routes answer.
    pub async fn spawn_with_empty_frontend() -> Self {
        Self::spawn_inner(MediaLimits::default(), true).await
    }

    async fn spawn_inner(limits: MediaLimits, with_frontend: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let records = SqliteEntryStore::new(temp_dir.path().join("entries.db"))
            .expect("Failed to open entries database");
        let blobs = FsBlobStore::new(temp_dir.path().join("media"));
        blobs.init().await.expect("Failed to create media dirs");
        let store = LocalEntryStore::new(records, blobs);
        let frontend_dir_path = if with_frontend {
            let path = temp_dir.path().join("frontend");
            std::fs::create_dir(&path).expect("Failed to create frontend dir");
            Some(path.to_string_lossy().into_owned())
        } else {
            None
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path,
            limits,
        };
        let app = make_app(config, store.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Waits for the server to become ready by polling `GET /api/entries`
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/api/entries?limit=1", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
