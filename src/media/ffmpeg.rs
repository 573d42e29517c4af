//! [`MediaEditor`] backed by the ffmpeg command line tool.

use super::editor::{CropRequest, MediaEditor, MediaEditorError, TrimRange};
use crate::entry::MediaFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const TRIMMED_VIDEO_NAME: &str = "trimmed_video.mp4";
pub const THUMBNAIL_NAME: &str = "thumbnail.jpg";

pub struct FfmpegMediaEditor {
    ffmpeg_path: PathBuf,
}

impl Default for FfmpegMediaEditor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegMediaEditor {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Check if ffmpeg is available.
    pub async fn check_available(&self) -> Result<(), MediaEditorError> {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if !status.success() {
            return Err(MediaEditorError::ProcessingFailed(
                "ffmpeg not found or not working".to_string(),
            ));
        }
        Ok(())
    }

    async fn run(
        &self,
        raw: &MediaFile,
        args: impl FnOnce(&Path, &Path) -> Vec<String>,
        output_name: &str,
        output_mime: &str,
    ) -> Result<MediaFile, MediaEditorError> {
        let work_dir = tempfile::tempdir()?;
        let input_path = work_dir.path().join(input_file_name(&raw.file_name));
        let output_path = work_dir.path().join(output_name);
        tokio::fs::write(&input_path, &raw.data).await?;

        let args = args(&input_path, &output_path);
        debug!("Running {:?} {}", self.ffmpeg_path, args.join(" "));
        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaEditorError::ProcessingFailed(stderr.to_string()));
        }

        let data = tokio::fs::read(&output_path).await?;
        Ok(MediaFile::new(output_name, output_mime, data))
    }
}

/// Keeps the extension of the raw file so ffmpeg can pick the demuxer.
fn input_file_name(raw_name: &str) -> String {
    match Path::new(raw_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("input.{}", ext.to_lowercase()),
        None => "input".to_string(),
    }
}

pub fn trim_args(input: &Path, output: &Path, range: TrimRange) -> Vec<String> {
    vec![
        "-ss".to_string(),
        format!("{:.2}", range.start_secs),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-t".to_string(),
        format!("{:.2}", range.duration_secs()),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

pub fn crop_filter(request: CropRequest) -> String {
    match request.region {
        Some(region) => format!(
            "crop={}:{}:{}:{}",
            region.size, region.size, region.x, region.y
        ),
        None => "crop='min(iw,ih)':'min(iw,ih)'".to_string(),
    }
}

pub fn crop_args(input: &Path, output: &Path, request: CropRequest) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        crop_filter(request),
        "-frames:v".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        "2".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

#[async_trait]
impl MediaEditor for FfmpegMediaEditor {
    async fn crop(
        &self,
        raw: &MediaFile,
        request: CropRequest,
    ) -> Result<MediaFile, MediaEditorError> {
        self.run(
            raw,
            |input, output| crop_args(input, output, request),
            THUMBNAIL_NAME,
            "image/jpeg",
        )
        .await
    }

    async fn trim(&self, raw: &MediaFile, range: TrimRange) -> Result<MediaFile, MediaEditorError> {
        self.run(
            raw,
            |input, output| trim_args(input, output, range),
            TRIMMED_VIDEO_NAME,
            "video/mp4",
        )
        .await
    }
}
