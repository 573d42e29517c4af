use super::editor::{EditRequest, MediaEditor, MediaEditorError};
use crate::entry::{CollectionError, EntryCollection, EntryField, MediaFile};
use thiserror::Error;
use tracing::{info, warn};

/// A failed edit, reported against the field it was meant to fill.
#[derive(Debug, Error)]
pub enum FieldEditError {
    #[error("Could not prepare the {field} of entry {index}: {source}")]
    Media {
        index: usize,
        field: &'static str,
        #[source]
        source: MediaEditorError,
    },

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Runs `request` on `raw` and stores the result on entry `index`.
///
/// Crops fill the thumbnail, trims fill the video. On failure the entry is
/// left untouched.
pub async fn apply_edit(
    editor: &dyn MediaEditor,
    collection: &mut EntryCollection,
    index: usize,
    raw: &MediaFile,
    request: EditRequest,
) -> Result<(), FieldEditError> {
    let field = match request {
        EditRequest::Crop(_) => "thumbnail",
        EditRequest::Trim(_) => "video",
    };
    if collection.get(index).is_none() {
        return Err(CollectionError::IndexOutOfRange {
            index,
            len: collection.len(),
        }
        .into());
    }

    let finished = editor.edit(raw, request).await.map_err(|source| {
        warn!("Editing {} for entry {} failed: {}", field, index, source);
        FieldEditError::Media {
            index,
            field,
            source,
        }
    })?;
    info!(
        "Prepared {} {} ({} bytes) for entry {}",
        field,
        finished.file_name,
        finished.size(),
        index
    );

    let value = match request {
        EditRequest::Crop(_) => EntryField::Thumbnail(Some(finished)),
        EditRequest::Trim(_) => EntryField::Video(Some(finished)),
    };
    collection.set_field(index, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{CropRequest, TrimRange};
    use crate::tags::TagMemory;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FakeEditor {
        fail: bool,
    }

    #[async_trait]
    impl MediaEditor for FakeEditor {
        async fn crop(
            &self,
            _raw: &MediaFile,
            _request: CropRequest,
        ) -> Result<MediaFile, MediaEditorError> {
            if self.fail {
                return Err(MediaEditorError::ProcessingFailed("bad image".to_string()));
            }
            Ok(MediaFile::new("thumbnail.jpg", "image/jpeg", vec![0xff, 0xd8]))
        }

        async fn trim(
            &self,
            _raw: &MediaFile,
            _range: TrimRange,
        ) -> Result<MediaFile, MediaEditorError> {
            if self.fail {
                return Err(MediaEditorError::ProcessingFailed("bad video".to_string()));
            }
            Ok(MediaFile::new(
                "trimmed_video.mp4",
                "video/mp4",
                vec![0u8; 2 * 1024 * 1024],
            ))
        }
    }

    fn raw() -> MediaFile {
        MediaFile::new("raw.bin", "application/octet-stream", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn trim_fills_video_and_file_size() {
        let mut collection = EntryCollection::new(Arc::new(TagMemory::in_memory()));
        let editor = FakeEditor { fail: false };
        let range = TrimRange::new(0.0, 2.0).unwrap();

        apply_edit(&editor, &mut collection, 0, &raw(), EditRequest::Trim(range))
            .await
            .unwrap();

        let entry = collection.get(0).unwrap();
        assert_eq!(entry.video.as_ref().unwrap().file_name, "trimmed_video.mp4");
        assert_eq!(entry.file_size.as_deref(), Some("2.00"));
    }

    #[tokio::test]
    async fn crop_fills_thumbnail() {
        let mut collection = EntryCollection::new(Arc::new(TagMemory::in_memory()));
        let editor = FakeEditor { fail: false };

        apply_edit(
            &editor,
            &mut collection,
            0,
            &raw(),
            EditRequest::Crop(CropRequest::centered()),
        )
        .await
        .unwrap();

        assert_eq!(
            collection.get(0).unwrap().thumbnail.as_ref().unwrap().mime_type,
            "image/jpeg"
        );
    }

    #[tokio::test]
    async fn failure_is_reported_against_the_field() {
        let mut collection = EntryCollection::new(Arc::new(TagMemory::in_memory()));
        let editor = FakeEditor { fail: true };

        let err = apply_edit(
            &editor,
            &mut collection,
            0,
            &raw(),
            EditRequest::Crop(CropRequest::centered()),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            FieldEditError::Media {
                index: 0,
                field: "thumbnail",
                ..
            }
        ));
        assert!(collection.get(0).unwrap().thumbnail.is_none());
    }
}
