//! `/api` routes: the wire side of [`crate::entry_store::EntryStore`].

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::state::{GuardedEntryStore, ServerState};
use super::ServerConfig;
use crate::entry::{DanceStyle, Entry, Level, MediaFile, TagList};
use crate::entry_store::{
    BlobKind, BlobReceipt, EntryCreated, EntryRecord, EntryStore, ExistsResponse, StoreError,
    StoreErrorBody, UploadReceipt,
};
use crate::media::{format_file_size, MediaLimits};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful";

/// Error reply of every `/api` route.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: StoreErrorBody,
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: StoreErrorBody::invalid(message),
        }
    }

    fn too_large(field: &str, limit: u64) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            body: StoreErrorBody::invalid(format!(
                "File size exceeds the maximum limit of {} MB for the {}",
                limit / (1024 * 1024),
                field
            )),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(name) => Self {
                status: StatusCode::CONFLICT,
                body: StoreErrorBody::duplicate(&name),
            },
            StoreError::DuplicateFile(name) => Self {
                status: StatusCode::CONFLICT,
                body: StoreErrorBody::duplicate_file(&name),
            },
            StoreError::Fatal(detail) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: StoreErrorBody::fatal(detail),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Form fields of `POST /api/upload`, collected before validation.
#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    dance_style: Option<String>,
    level: Option<String>,
    tags: Option<String>,
    file_size: Option<String>,
    video: Option<MediaFile>,
    thumbnail: Option<MediaFile>,
}

impl UploadForm {
    /// Reads the form, streaming each media field and giving up with 413 as
    /// soon as it grows past its limit.
    async fn read(mut multipart: Multipart, limits: &MediaLimits) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        loop {
            let mut field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(ApiError::invalid(format!("Malformed form: {}", e))),
            };
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "video" | "thumbnail" => {
                    let limit = if name == "video" {
                        limits.max_video_size
                    } else {
                        limits.max_thumbnail_size
                    };
                    let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                    let mime_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let mut data = Vec::new();
                    loop {
                        let chunk = field.chunk().await.map_err(|e| {
                            ApiError::invalid(format!("Failed to read {}: {}", name, e))
                        })?;
                        let Some(chunk) = chunk else { break };
                        if (data.len() + chunk.len()) as u64 > limit {
                            debug!("Upload field {} over {} bytes, rejecting", name, limit);
                            return Err(ApiError::too_large(&name, limit));
                        }
                        data.extend_from_slice(&chunk);
                    }
                    let file = MediaFile::new(file_name, mime_type, data);
                    if name == "video" {
                        form.video = Some(file);
                    } else {
                        form.thumbnail = Some(file);
                    }
                }
                "title" | "danceStyle" | "level" | "tags" | "fileSize" => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::invalid(format!("Failed to read {}: {}", name, e))
                    })?;
                    let slot = match name.as_str() {
                        "title" => &mut form.title,
                        "danceStyle" => &mut form.dance_style,
                        "level" => &mut form.level,
                        "tags" => &mut form.tags,
                        _ => &mut form.file_size,
                    };
                    *slot = Some(value);
                }
                other => debug!("Ignoring unknown upload field {}", other),
            }
        }
        Ok(form)
    }

    fn into_entry(self) -> Result<Entry, ApiError> {
        let dance_style = self
            .dance_style
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<DanceStyle>())
            .transpose()
            .map_err(ApiError::invalid)?;
        let level = self
            .level
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Level>())
            .transpose()
            .map_err(ApiError::invalid)?;
        let tags = match self.tags.filter(|s| !s.trim().is_empty()) {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .map(TagList::from)
                .map_err(|e| ApiError::invalid(format!("Invalid tags: {}", e)))?,
            None => TagList::new(),
        };
        let file_size = self
            .file_size
            .filter(|s| !s.is_empty())
            .or_else(|| self.video.as_ref().map(|v| format_file_size(v.size())));

        Ok(Entry {
            title: self.title.unwrap_or_default(),
            dance_style,
            level,
            tags,
            video: self.video,
            thumbnail: self.thumbnail,
            file_size,
        })
    }
}

async fn post_upload(
    State(config): State<ServerConfig>,
    State(store): State<GuardedEntryStore>,
    multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let entry = UploadForm::read(multipart, &config.limits)
        .await?
        .into_entry()?;

    let Some(submittable) = entry.as_submittable() else {
        return Err(ApiError::invalid(format!(
            "Missing required fields: {}",
            entry.missing_fields().join(", ")
        )));
    };

    let id = store.upload(submittable).await.map_err(|e| {
        warn!("Upload of {} rejected: {}", submittable.title, e);
        ApiError::from(e)
    })?;
    info!("Stored dance move {} as {}", submittable.title, id);
    Ok(Json(UploadReceipt {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        id,
    }))
}

#[derive(Deserialize)]
struct ExistsQuery {
    title: String,
}

async fn get_exists(
    State(store): State<GuardedEntryStore>,
    Query(query): Query<ExistsQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = store.exists(&query.title).await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn put_blob(
    State(config): State<ServerConfig>,
    State(store): State<GuardedEntryStore>,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<BlobReceipt>, ApiError> {
    let kind = kind.parse::<BlobKind>().map_err(ApiError::invalid)?;
    let limit = match kind {
        BlobKind::Video => config.limits.max_video_size,
        BlobKind::Thumbnail => config.limits.max_thumbnail_size,
    };
    if body.len() as u64 > limit {
        return Err(ApiError::too_large(kind.as_str(), limit));
    }
    let key = store.put_blob(kind, &body, &name).await?;
    Ok(Json(BlobReceipt { key }))
}

async fn post_entry(
    State(store): State<GuardedEntryStore>,
    Json(record): Json<EntryRecord>,
) -> Result<Json<EntryCreated>, ApiError> {
    if record.title.trim().is_empty() {
        return Err(ApiError::invalid("Missing required fields: title"));
    }
    store.put_entry(&record).await?;
    Ok(Json(EntryCreated { id: record.id }))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_list_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_list_limit() -> usize {
    100
}

async fn list_entries(
    State(store): State<GuardedEntryStore>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<EntryRecord>>, ApiError> {
    let records = store
        .records()
        .list(query.limit, query.offset)
        .map_err(|e| StoreError::fatal(format!("{:#}", e)))?;
    Ok(Json(records))
}

async fn get_blob(
    State(store): State<GuardedEntryStore>,
    Path((dir, name)): Path<(String, String)>,
) -> Response {
    let key = format!("{}/{}", dir, name);
    match store.blobs().read(&key).await {
        Ok(Some(data)) => {
            let content_type = infer::get(&data)
                .map(|t| t.mime_type())
                .unwrap_or("application/octet-stream");
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(data))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            debug!("Rejected blob key {}: {}", key, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

pub fn make_upload_routes(state: ServerState) -> Router {
    Router::new()
        .route("/upload", post(post_upload))
        .route("/entries", get(list_entries).post(post_entry))
        .route("/entries/exists", get(get_exists))
        .route("/blobs/{kind}/{name}", get(get_blob).put(put_blob))
        .with_state(state)
}
