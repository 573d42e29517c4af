//! HTTP client for a remote dance-vocab server.

use super::models::{
    BlobKind, BlobReceipt, EntryCreated, EntryRecord, ExistsResponse, StoreError,
    StoreErrorBody, UploadReceipt,
};
use super::trait_def::EntryStore;
use crate::entry::{MediaFile, SubmittableEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// [`EntryStore`] talking to the server's `/api` routes.
pub struct HttpEntryStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpEntryStore {
    /// # Arguments
    /// * `base_url` - Server root (e.g., "http://localhost:3001")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid server url {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Server url {} cannot have a path", base_url);
        }
        Ok(Self { client, base_url })
    }

    /// Check that the server's `/api` routes answer. `/` may be a static frontend.
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url(&["api", "entries"]))
            .query(&[("limit", "1")])
            .send()
            .await
            .context("Failed to connect to server")?;
        if !response.status().is_success() {
            anyhow::bail!("Server health check failed with status: {}", response.status());
        }
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| StoreError::Fatal(format!("Malformed server response: {}", e)));
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Server answered {}: {}", status, body);
        match serde_json::from_str::<StoreErrorBody>(&body) {
            Ok(error) => Err(error.into_store_error()),
            Err(_) => Err(StoreError::Fatal(format!(
                "Server responded with status {}",
                status
            ))),
        }
    }

    fn file_part(file: &MediaFile) -> Result<Part, StoreError> {
        Part::bytes(file.data.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(StoreError::fatal)
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Fatal(format!("Request failed: {}", e))
}

#[async_trait]
impl EntryStore for HttpEntryStore {
    async fn exists(&self, title: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(self.url(&["api", "entries", "exists"]))
            .query(&[("title", title)])
            .send()
            .await
            .map_err(transport)?;
        let body: ExistsResponse = Self::parse(response).await?;
        Ok(body.exists)
    }

    async fn put_blob(
        &self,
        kind: BlobKind,
        data: &[u8],
        suggested_name: &str,
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .put(self.url(&["api", "blobs", kind.as_str(), suggested_name]))
            .body(data.to_vec())
            .send()
            .await
            .map_err(transport)?;
        let body: BlobReceipt = Self::parse(response).await?;
        Ok(body.key)
    }

    async fn put_entry(&self, record: &EntryRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url(&["api", "entries"]))
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        let _: EntryCreated = Self::parse(response).await?;
        Ok(())
    }

    /// One multipart request; the server checks, stores and records atomically per entry.
    async fn upload(&self, entry: SubmittableEntry<'_>) -> Result<String, StoreError> {
        let tags = serde_json::to_string(entry.tags.as_slice()).map_err(StoreError::fatal)?;
        let mut form = Form::new()
            .part("video", Self::file_part(entry.video)?)
            .part("thumbnail", Self::file_part(entry.thumbnail)?)
            .text("title", entry.title.to_string())
            .text("danceStyle", entry.dance_style.as_str())
            .text("level", entry.level.value().to_string())
            .text("tags", tags);
        if let Some(file_size) = entry.file_size {
            form = form.text("fileSize", file_size.to_string());
        }

        let response = self
            .client
            .post(self.url(&["api", "upload"]))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let receipt: UploadReceipt = Self::parse(response).await?;
        debug!("{}: {} stored as {}", receipt.message, entry.title, receipt.id);
        Ok(receipt.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_encode_segments() {
        let store = HttpEntryStore::new("http://localhost:3001/", 5).unwrap();
        assert_eq!(
            store.url(&["api", "blobs", "video", "my clip.mp4"]).as_str(),
            "http://localhost:3001/api/blobs/video/my%20clip.mp4"
        );
        assert_eq!(
            store.url(&["api", "entries"]).as_str(),
            "http://localhost:3001/api/entries"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(HttpEntryStore::new("not a url", 5).is_err());
        assert!(HttpEntryStore::new("mailto:someone@example.com", 5).is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_fatal() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let store = HttpEntryStore::new("http://127.0.0.1:9", 1).unwrap();
        let err = store.exists("anything").await.unwrap_err();
        assert!(matches!(err, StoreError::Fatal(_)));
    }
}
