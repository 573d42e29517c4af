use crate::entry::{DanceStyle, Level, SubmittableEntry, TagList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure of an [`super::EntryStore`] operation, classified where it happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// An entry with this title already exists remotely.
    #[error("An entry titled \"{0}\" already exists")]
    Duplicate(String),

    /// A blob stored under this file name already exists remotely.
    #[error("A file named \"{0}\" already exists")]
    DuplicateFile(String),

    /// Anything else: transport, permissions, storage.
    #[error("{0}")]
    Fatal(String),
}

impl StoreError {
    pub fn fatal(err: impl fmt::Display) -> Self {
        StoreError::Fatal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Video,
    Thumbnail,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKind::Video => "video",
            BlobKind::Thumbnail => "thumbnail",
        }
    }

    /// Top level directory of the blob keys of this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BlobKind::Video => "videos",
            BlobKind::Thumbnail => "thumbnails",
        }
    }

    pub fn from_dir_name(dir: &str) -> Option<Self> {
        [BlobKind::Video, BlobKind::Thumbnail]
            .into_iter()
            .find(|kind| kind.dir_name() == dir)
    }
}

impl FromStr for BlobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(BlobKind::Video),
            "thumbnail" => Ok(BlobKind::Thumbnail),
            _ => Err(format!("Unknown blob kind: {}", s)),
        }
    }
}

/// A stored dance move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: String,
    pub title: String,
    pub dance_style: DanceStyle,
    pub level: Level,
    #[serde(default)]
    pub tags: TagList,
    pub video_key: String,
    pub thumbnail_key: String,
    #[serde(default)]
    pub file_size: Option<String>,
    /// RFC 3339.
    pub created_at: String,
}

impl EntryRecord {
    pub fn new(entry: SubmittableEntry<'_>, video_key: String, thumbnail_key: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: entry.title.to_string(),
            dance_style: entry.dance_style,
            level: entry.level,
            tags: entry.tags.clone(),
            video_key,
            thumbnail_key,
            file_size: entry.file_size.map(str::to_string),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// JSON body of every non-2xx store response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreErrorBody {
    pub error: String,
    /// `duplicate`, `duplicate_file`, `invalid` or `fatal`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
}

impl StoreErrorBody {
    pub fn duplicate(name: &str) -> Self {
        Self {
            error: StoreError::Duplicate(name.to_string()).to_string(),
            kind: "duplicate".to_string(),
            conflict: Some(name.to_string()),
        }
    }

    pub fn duplicate_file(name: &str) -> Self {
        Self {
            error: StoreError::DuplicateFile(name.to_string()).to_string(),
            kind: "duplicate_file".to_string(),
            conflict: Some(name.to_string()),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: "invalid".to_string(),
            conflict: None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: "fatal".to_string(),
            conflict: None,
        }
    }

    pub fn into_store_error(self) -> StoreError {
        match (self.kind.as_str(), self.conflict) {
            ("duplicate", Some(name)) => StoreError::Duplicate(name),
            ("duplicate_file", Some(name)) => StoreError::DuplicateFile(name),
            _ => StoreError::Fatal(self.error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreated {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
