//! Crop and trim contract used to turn raw uploads into finished media.

use crate::entry::MediaFile;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaEditorError {
    #[error("Invalid trim range: {0}")]
    InvalidTrimRange(String),

    #[error("Invalid crop region: {0}")]
    InvalidCropRegion(String),

    #[error("ffmpeg failed: {0}")]
    ProcessingFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Portion of a video to keep, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TrimRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Result<Self, MediaEditorError> {
        if !start_secs.is_finite() || !end_secs.is_finite() {
            return Err(MediaEditorError::InvalidTrimRange(
                "bounds must be finite".to_string(),
            ));
        }
        if start_secs < 0.0 {
            return Err(MediaEditorError::InvalidTrimRange(format!(
                "start {:.2}s is negative",
                start_secs
            )));
        }
        if end_secs <= start_secs {
            return Err(MediaEditorError::InvalidTrimRange(format!(
                "end {:.2}s is not after start {:.2}s",
                end_secs, start_secs
            )));
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Square region of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Square crop of a thumbnail. Without a region the centered largest square is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropRequest {
    pub region: Option<CropRegion>,
}

impl CropRequest {
    pub fn centered() -> Self {
        Self::default()
    }

    pub fn region(x: u32, y: u32, size: u32) -> Result<Self, MediaEditorError> {
        if size == 0 {
            return Err(MediaEditorError::InvalidCropRegion(
                "size must be positive".to_string(),
            ));
        }
        Ok(Self {
            region: Some(CropRegion { x, y, size }),
        })
    }
}

/// One editing step on a raw file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditRequest {
    /// Produces the entry's thumbnail.
    Crop(CropRequest),
    /// Produces the entry's video.
    Trim(TrimRange),
}

/// Produces finished media from raw uploads.
#[async_trait]
pub trait MediaEditor: Send + Sync {
    /// Square JPEG thumbnail from an image.
    async fn crop(&self, raw: &MediaFile, request: CropRequest)
        -> Result<MediaFile, MediaEditorError>;

    /// MP4 clip covering `range` of a video.
    async fn trim(&self, raw: &MediaFile, range: TrimRange) -> Result<MediaFile, MediaEditorError>;

    async fn edit(
        &self,
        raw: &MediaFile,
        request: EditRequest,
    ) -> Result<MediaFile, MediaEditorError> {
        match request {
            EditRequest::Crop(crop) => self.crop(raw, crop).await,
            EditRequest::Trim(range) => self.trim(raw, range).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_range_validation() {
        assert!(TrimRange::new(-1.0, 2.0).is_err());
        assert!(TrimRange::new(3.0, 3.0).is_err());
        assert!(TrimRange::new(0.0, f64::NAN).is_err());
        let range = TrimRange::new(1.5, 4.0).unwrap();
        assert_eq!(range.duration_secs(), 2.5);
    }

    #[test]
    fn crop_region_requires_positive_size() {
        assert!(CropRequest::region(0, 0, 0).is_err());
        assert_eq!(
            CropRequest::region(10, 20, 300).unwrap().region,
            Some(CropRegion {
                x: 10,
                y: 20,
                size: 300
            })
        );
        assert!(CropRequest::centered().region.is_none());
    }
}
