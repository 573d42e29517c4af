mod file_config;

pub use file_config::{FileConfig, UploaderConfig};

use crate::entry::TagList;
use crate::media::{MediaLimits, MAX_THUMBNAIL_SIZE, MAX_VIDEO_SIZE};
use crate::pipeline::ResetPolicy;
use crate::server::RequestsLoggingLevel;
use crate::tags::DEFAULT_TAGS;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// Server CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_video_size: u64,
    pub max_thumbnail_size: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            media_path: None,
            port: 3001,
            logging_level: RequestsLoggingLevel::default(),
            frontend_dir_path: None,
            max_video_size: MAX_VIDEO_SIZE,
            max_thumbnail_size: MAX_THUMBNAIL_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    /// Root of the blob store.
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub limits: MediaLimits,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("media"));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let limits = MediaLimits {
            max_video_size: file.max_video_size.unwrap_or(cli.max_video_size),
            max_thumbnail_size: file.max_thumbnail_size.unwrap_or(cli.max_thumbnail_size),
        };
        if limits.max_video_size == 0 || limits.max_thumbnail_size == 0 {
            bail!("Media size limits must be positive");
        }

        Ok(Self {
            db_dir,
            media_path,
            port,
            logging_level,
            frontend_dir_path,
            limits,
        })
    }

    pub fn entries_db_path(&self) -> PathBuf {
        self.db_dir.join("entries.db")
    }
}

/// cli-upload arguments that can be overridden by the `[uploader]` TOML section.
#[derive(Debug, Clone)]
pub struct UploaderCliConfig {
    pub server_url: Option<String>,
    pub timeout_sec: u64,
    pub tags_db: Option<PathBuf>,
    pub reset_policy: ResetPolicy,
}

impl Default for UploaderCliConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            timeout_sec: 300,
            tags_db: None,
            reset_policy: ResetPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploaderSettings {
    pub server_url: String,
    pub timeout_sec: u64,
    /// Where used tags are remembered; in memory only when absent.
    pub tags_db: Option<PathBuf>,
    pub default_tags: TagList,
    pub starter_tags: TagList,
    pub reset_policy: ResetPolicy,
}

impl UploaderSettings {
    pub fn resolve(cli: &UploaderCliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config
            .and_then(|f| f.uploader)
            .unwrap_or_default();

        let server_url = file
            .server_url
            .or_else(|| cli.server_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("server_url must be specified via --server-url or in config file")
            })?;

        let reset_policy = match file.reset_policy {
            Some(s) => ResetPolicy::from_str(&s, true)
                .map_err(|_| anyhow::anyhow!("Invalid reset_policy: {}", s))?,
            None => cli.reset_policy,
        };

        let default_tags = match file.default_tags {
            Some(tags) => TagList::from(tags),
            None => DEFAULT_TAGS.iter().copied().collect(),
        };

        Ok(Self {
            server_url,
            timeout_sec: file.timeout_sec.unwrap_or(cli.timeout_sec),
            tags_db: file.tags_db.map(PathBuf::from).or_else(|| cli.tags_db.clone()),
            default_tags,
            starter_tags: file.starter_tags.map(TagList::from).unwrap_or_default(),
            reset_policy,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            media_path: Some(PathBuf::from("/media")),
            port: 3005,
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/frontend".to_string()),
            max_video_size: 2048,
            max_thumbnail_size: 1024,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.media_path, PathBuf::from("/media"));
        assert_eq!(config.port, 3005);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.frontend_dir_path, Some("/frontend".to_string()));
        assert_eq!(config.limits.max_video_size, 2048);
        assert_eq!(config.limits.max_thumbnail_size, 1024);
        assert_eq!(config.entries_db_path(), temp_dir.path().join("entries.db"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            media_path: Some(PathBuf::from("/cli/media")),
            logging_level: RequestsLoggingLevel::Path,
            ..Default::default()
        };
        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            media_path: Some("/toml/media".to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            max_video_size: Some(10),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.media_path, PathBuf::from("/toml/media"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.limits.max_video_size, 10);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.limits.max_thumbnail_size, MAX_THUMBNAIL_SIZE);
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_media_path_defaults_under_db_dir() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.media_path, temp_dir.path().join("media"));
        assert_eq!(config.limits, MediaLimits::default());
    }

    #[test]
    fn test_resolve_zero_limit_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            max_thumbnail_size: 0,
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_uploader_settings_defaults() {
        let cli = UploaderCliConfig {
            server_url: Some("http://localhost:3001".to_string()),
            ..Default::default()
        };
        let settings = UploaderSettings::resolve(&cli, None).unwrap();

        assert_eq!(settings.server_url, "http://localhost:3001");
        assert_eq!(settings.timeout_sec, 300);
        assert!(settings.tags_db.is_none());
        assert_eq!(settings.reset_policy, ResetPolicy::ClearAll);
        assert!(settings.default_tags.contains("turn"));
        assert!(settings.starter_tags.is_empty());
    }

    #[test]
    fn test_uploader_settings_toml_overrides_cli() {
        let cli = UploaderCliConfig {
            server_url: Some("http://cli:3001".to_string()),
            tags_db: Some(PathBuf::from("/cli/tags.db")),
            ..Default::default()
        };
        let file_config = FileConfig {
            uploader: Some(UploaderConfig {
                server_url: Some("http://toml:3001".to_string()),
                default_tags: Some(vec!["cumbia".to_string()]),
                starter_tags: Some(vec!["salsa".to_string(), "salsa".to_string()]),
                reset_policy: Some("keep-unsubmitted".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let settings = UploaderSettings::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(settings.server_url, "http://toml:3001");
        assert_eq!(settings.tags_db, Some(PathBuf::from("/cli/tags.db")));
        assert_eq!(settings.default_tags.as_slice(), &["cumbia".to_string()]);
        assert_eq!(settings.starter_tags.len(), 1);
        assert_eq!(settings.reset_policy, ResetPolicy::KeepUnsubmitted);
    }

    #[test]
    fn test_uploader_settings_errors() {
        assert!(UploaderSettings::resolve(&UploaderCliConfig::default(), None)
            .unwrap_err()
            .to_string()
            .contains("server_url must be specified"));

        let cli = UploaderCliConfig {
            server_url: Some("http://localhost:3001".to_string()),
            ..Default::default()
        };
        let file_config = FileConfig {
            uploader: Some(UploaderConfig {
                reset_policy: Some("sometimes".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(UploaderSettings::resolve(&cli, Some(file_config)).is_err());
    }
}
