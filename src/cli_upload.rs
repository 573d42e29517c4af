//! Batch uploader
//!
//! Reads a JSON manifest of dance moves, prepares their media and submits
//! them to a dance-vocab server one at a time.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dance_vocab_uploader::config::{FileConfig, UploaderCliConfig, UploaderSettings};
use dance_vocab_uploader::entry::{DanceStyle, EntryCollection, EntryField, Level, MediaFile};
use dance_vocab_uploader::entry_store::{EntryStore, HttpEntryStore};
use dance_vocab_uploader::media::{
    apply_edit, CropRequest, EditRequest, FfmpegMediaEditor, MediaEditor, TrimRange,
};
use dance_vocab_uploader::pipeline::{PipelineError, PipelineSettings, ResetPolicy, UploadPipeline};
use dance_vocab_uploader::tags::{
    InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore, TagMemory,
};

#[derive(Parser, Debug)]
#[command(name = "cli-upload")]
#[command(about = "Upload a batch of dance moves to a dance-vocab server")]
struct CliArgs {
    /// JSON manifest listing the entries to upload
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Path to a TOML config file. Its [uploader] section overrides the command line.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server root, e.g. http://localhost:3001
    #[arg(long)]
    server_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_sec: u64,

    /// SQLite file remembering used tags. Tags are kept in memory only when absent.
    #[arg(long)]
    tags_db: Option<PathBuf>,

    /// What to keep in the batch after a run that stored something
    #[arg(long, value_enum, default_value_t = ResetPolicy::ClearAll)]
    reset_policy: ResetPolicy,

    /// ffmpeg binary used for trims and crops
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    #[serde(default)]
    title: String,
    dance_style: Option<String>,
    level: Option<u8>,
    #[serde(default)]
    tags: Vec<String>,
    video: Option<ManifestVideo>,
    thumbnail: Option<ManifestThumbnail>,
}

#[derive(Debug, Deserialize)]
struct ManifestVideo {
    path: PathBuf,
    trim: Option<ManifestTrim>,
}

#[derive(Debug, Deserialize)]
struct ManifestTrim {
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct ManifestThumbnail {
    path: PathBuf,
    /// `{}` crops the centered square.
    crop: Option<ManifestCrop>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestCrop {
    x: Option<u32>,
    y: Option<u32>,
    size: Option<u32>,
}

impl ManifestTrim {
    fn to_request(&self) -> Result<EditRequest> {
        Ok(EditRequest::Trim(TrimRange::new(self.start, self.end)?))
    }
}

impl ManifestCrop {
    fn to_request(&self) -> Result<EditRequest> {
        let crop = match (self.x, self.y, self.size) {
            (None, None, None) => CropRequest::centered(),
            (Some(x), Some(y), Some(size)) => CropRequest::region(x, y, size)?,
            _ => bail!("A crop region needs x, y and size"),
        };
        Ok(EditRequest::Crop(crop))
    }
}

impl Manifest {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
        if manifest.entries.is_empty() {
            bail!("Manifest {:?} lists no entries", path);
        }
        Ok(manifest)
    }

    fn needs_editor(&self) -> bool {
        self.entries.iter().any(|e| {
            e.video.as_ref().is_some_and(|v| v.trim.is_some())
                || e.thumbnail.as_ref().is_some_and(|t| t.crop.is_some())
        })
    }

    /// Paths in the manifest are relative to its own directory.
    fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

async fn read_media(path: &Path) -> Result<MediaFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read media file: {:?}", path))?;
    let mime_type = infer::get(&data)
        .map(|t| t.mime_type())
        .unwrap_or("application/octet-stream");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(MediaFile::new(file_name, mime_type, data))
}

/// Fills entry `index` from its manifest description.
async fn fill_entry(
    collection: &mut EntryCollection,
    index: usize,
    entry: &ManifestEntry,
    base_dir: &Path,
    editor: Option<&dyn MediaEditor>,
) -> Result<()> {
    collection.set_field(index, EntryField::Title(entry.title.clone()))?;

    let dance_style = entry
        .dance_style
        .as_deref()
        .map(|s| s.parse::<DanceStyle>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    collection.set_field(index, EntryField::DanceStyle(dance_style))?;

    let level = entry
        .level
        .map(|v| Level::new(v).with_context(|| format!("Invalid level {}", v)))
        .transpose()?;
    collection.set_field(index, EntryField::Level(level))?;

    for tag in &entry.tags {
        collection.add_tag(index, tag)?;
    }

    if let Some(video) = &entry.video {
        let raw = read_media(&Manifest::resolve(base_dir, &video.path)).await?;
        match (&video.trim, editor) {
            (Some(trim), Some(editor)) => {
                apply_edit(editor, collection, index, &raw, trim.to_request()?).await?
            }
            _ => collection.set_field(index, EntryField::Video(Some(raw)))?,
        }
    }

    if let Some(thumbnail) = &entry.thumbnail {
        let raw = read_media(&Manifest::resolve(base_dir, &thumbnail.path)).await?;
        match (&thumbnail.crop, editor) {
            (Some(crop), Some(editor)) => {
                apply_edit(editor, collection, index, &raw, crop.to_request()?).await?
            }
            _ => collection.set_field(index, EntryField::Thumbnail(Some(raw)))?,
        }
    }
    Ok(())
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(format!("uploading {} dance moves", total));
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let settings = UploaderSettings::resolve(
        &UploaderCliConfig {
            server_url: cli_args.server_url.clone(),
            timeout_sec: cli_args.timeout_sec,
            tags_db: cli_args.tags_db.clone(),
            reset_policy: cli_args.reset_policy,
        },
        file_config,
    )?;

    let manifest = Manifest::load(&cli_args.manifest)?;
    let base_dir = cli_args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let tag_store: Arc<dyn KeyValueStore> = match &settings.tags_db {
        Some(path) => Arc::new(SqliteKeyValueStore::new(path)?),
        None => Arc::new(InMemoryKeyValueStore::default()),
    };
    let tag_memory = TagMemory::with_defaults(tag_store, settings.default_tags.clone());
    let mut collection =
        EntryCollection::new(Arc::new(tag_memory)).with_starter_tags(settings.starter_tags.clone());

    let editor = if manifest.needs_editor() {
        let editor = FfmpegMediaEditor::new(&cli_args.ffmpeg_path);
        editor
            .check_available()
            .await
            .context("Trims and crops need ffmpeg")?;
        Some(editor)
    } else {
        None
    };

    for (position, entry) in manifest.entries.iter().enumerate() {
        let index = if position == 0 { 0 } else { collection.add() };
        fill_entry(
            &mut collection,
            index,
            entry,
            &base_dir,
            editor.as_ref().map(|e| e as &dyn MediaEditor),
        )
        .await
        .with_context(|| format!("Entry {} ({:?})", position + 1, entry.title))?;
    }

    let store = HttpEntryStore::new(&settings.server_url, settings.timeout_sec)?;
    store.health_check().await?;
    let store: Arc<dyn EntryStore> = Arc::new(store);
    let pipeline = UploadPipeline::with_settings(
        store,
        PipelineSettings {
            reset_policy: settings.reset_policy,
        },
    );

    let bar = progress_bar(collection.len());
    let mut events = pipeline.subscribe();
    let listener = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if event.is_uploading {
                    bar.set_position(event.progress.round() as u64);
                }
            }
        })
    };

    let result = pipeline.submit(&mut collection).await;
    listener.abort();
    bar.finish_and_clear();

    match result {
        Ok(outcome) => {
            for index in &outcome.skipped {
                warn!("Skipped incomplete entry {}", index + 1);
            }
            if let Some(message) = &outcome.success_message {
                println!("{}", message);
            }
            if let Some(message) = &outcome.error_message {
                eprintln!("{}", message);
            }
            info!(
                "{} entries left in the batch after the run",
                collection.len()
            );
            if !outcome.is_complete() {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(PipelineError::Validation { invalid }) => {
            for entry in &invalid {
                eprintln!(
                    "Entry {} is missing: {}",
                    entry.index + 1,
                    entry.missing.join(", ")
                );
            }
            bail!("{}", PipelineError::Validation { invalid })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dance_vocab_uploader::entry::TagList;

    #[test]
    fn parses_manifest() {
        let json = r#"{
            "entries": [
                {
                    "title": "Dile que no",
                    "danceStyle": "cuban_salsa",
                    "level": 1,
                    "tags": ["basic step"],
                    "video": {"path": "dqn.mp4", "trim": {"start": 1.5, "end": 9}},
                    "thumbnail": {"path": "dqn.png", "crop": {}}
                },
                {"title": "Sombrero"}
            ]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();

        assert_eq!(manifest.entries.len(), 2);
        assert!(manifest.needs_editor());
        let first = &manifest.entries[0];
        assert_eq!(first.level, Some(1));
        assert!(matches!(
            first.video.as_ref().unwrap().trim.as_ref().unwrap().to_request(),
            Ok(EditRequest::Trim(_))
        ));
        assert!(matches!(
            first.thumbnail.as_ref().unwrap().crop.as_ref().unwrap().to_request(),
            Ok(EditRequest::Crop(CropRequest { region: None }))
        ));
        assert!(manifest.entries[1].video.is_none());
    }

    #[test]
    fn partial_crop_region_is_rejected() {
        let crop = ManifestCrop {
            x: Some(10),
            ..Default::default()
        };
        assert!(crop.to_request().is_err());
    }

    #[test]
    fn manifest_paths_resolve_against_its_directory() {
        assert_eq!(
            Manifest::resolve(Path::new("/batch"), Path::new("clip.mp4")),
            PathBuf::from("/batch/clip.mp4")
        );
        assert_eq!(
            Manifest::resolve(Path::new("/batch"), Path::new("/abs/clip.mp4")),
            PathBuf::from("/abs/clip.mp4")
        );
    }

    #[tokio::test]
    async fn fills_entry_without_edits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"video bytes").unwrap();
        std::fs::write(dir.path().join("thumb.jpg"), b"\xff\xd8\xff\xe0jpeg").unwrap();
        let entry: ManifestEntry = serde_json::from_str(
            r#"{
                "title": "Vacilala",
                "danceStyle": "Cuban Salsa",
                "level": 3,
                "tags": [" turn ", "turn"],
                "video": {"path": "clip.mp4"},
                "thumbnail": {"path": "thumb.jpg"}
            }"#,
        )
        .unwrap();
        let mut collection = EntryCollection::new(Arc::new(TagMemory::in_memory()));

        fill_entry(&mut collection, 0, &entry, dir.path(), None)
            .await
            .unwrap();

        let filled = collection.get(0).unwrap();
        assert!(filled.is_submittable());
        assert_eq!(filled.tags, TagList::from(vec!["turn".to_string()]));
        assert_eq!(filled.thumbnail.as_ref().unwrap().mime_type, "image/jpeg");
        assert_eq!(filled.video.as_ref().unwrap().file_name, "clip.mp4");
        assert_eq!(filled.file_size.as_deref(), Some("0.00"));
    }

    #[tokio::test]
    async fn missing_media_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let entry: ManifestEntry =
            serde_json::from_str(r#"{"title": "Ghost", "video": {"path": "nope.mp4"}}"#).unwrap();
        let mut collection = EntryCollection::new(Arc::new(TagMemory::in_memory()));

        let err = fill_entry(&mut collection, 0, &entry, dir.path(), None)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("nope.mp4"));
    }
}
