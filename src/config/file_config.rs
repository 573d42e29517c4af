use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Server settings (can override CLI)
    pub db_dir: Option<String>,
    pub media_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub max_video_size: Option<u64>,
    pub max_thumbnail_size: Option<u64>,

    // cli-upload settings
    pub uploader: Option<UploaderConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UploaderConfig {
    pub server_url: Option<String>,
    pub timeout_sec: Option<u64>,
    pub tags_db: Option<String>,
    /// Replaces the built-in tag suggestions.
    pub default_tags: Option<Vec<String>>,
    /// Tags every new entry starts with.
    pub starter_tags: Option<Vec<String>>,
    /// "clear-all" or "keep-unsubmitted"
    pub reset_policy: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
