//! Finished media for entries: crop and trim editing, size limits.

mod apply;
mod editor;
mod ffmpeg;
mod limits;

pub use apply::{apply_edit, FieldEditError};
pub use editor::{
    CropRegion, CropRequest, EditRequest, MediaEditor, MediaEditorError, TrimRange,
};
pub use ffmpeg::{FfmpegMediaEditor, THUMBNAIL_NAME, TRIMMED_VIDEO_NAME};
pub use limits::{format_file_size, MediaLimits, MAX_THUMBNAIL_SIZE, MAX_VIDEO_SIZE};
