//! HTTP client for end-to-end tests
//!
//! Raw access to the `/api` routes, for checks the `HttpEntryStore` doesn't expose.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// Multipart upload of `title` with the stand-in media and extra text fields.
    pub async fn upload(&self, title: &str, fields: &[(&str, &str)]) -> Response {
        let mut form = Form::new()
            .part(
                "video",
                Part::bytes(VIDEO_BYTES.to_vec())
                    .file_name(format!("{}.mp4", title))
                    .mime_str("video/mp4")
                    .unwrap(),
            )
            .part(
                "thumbnail",
                Part::bytes(THUMBNAIL_BYTES.to_vec())
                    .file_name(format!("{}.jpg", title))
                    .mime_str("image/jpeg")
                    .unwrap(),
            )
            .text("title", title.to_string());
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        self.client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    pub async fn exists(&self, title: &str) -> Response {
        self.client
            .get(format!("{}/api/entries/exists", self.base_url))
            .query(&[("title", title)])
            .send()
            .await
            .expect("Exists request failed")
    }

    pub async fn list_entries(&self) -> Response {
        self.client
            .get(format!("{}/api/entries", self.base_url))
            .send()
            .await
            .expect("List request failed")
    }

    /// `key` as returned by the server, e.g. "videos/1700000000000-clip.mp4".
    pub async fn get_blob(&self, key: &str) -> Response {
        self.client
            .get(format!("{}/api/blobs/{}", self.base_url, key))
            .send()
            .await
            .expect("Blob request failed")
    }
}
