//! Ordered list of draft entries edited by the form.

use super::models::{Entry, EntryField, MediaFile, TagList};
use crate::media::{format_file_size, MediaLimits};
use crate::tags::TagMemory;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("No entry at index {index} (collection has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("File size exceeds the maximum limit of {limit_mb} MB for the {field}")]
    FileTooLarge {
        field: &'static str,
        size: u64,
        limit_mb: u64,
    },
}

/// The draft entries of one form, in display and submission order.
///
/// Always holds at least one entry.
pub struct EntryCollection {
    entries: Vec<Entry>,
    starter_tags: TagList,
    limits: MediaLimits,
    tag_memory: Arc<TagMemory>,
}

impl EntryCollection {
    /// A collection with one blank entry.
    pub fn new(tag_memory: Arc<TagMemory>) -> Self {
        Self {
            entries: vec![Entry::default()],
            starter_tags: TagList::new(),
            limits: MediaLimits::default(),
            tag_memory,
        }
    }

    /// Tags every new blank entry starts with.
    pub fn with_starter_tags(mut self, starter_tags: TagList) -> Self {
        self.starter_tags = starter_tags;
        self.reset();
        self
    }

    pub fn with_limits(mut self, limits: MediaLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn tag_memory(&self) -> &Arc<TagMemory> {
        &self.tag_memory
    }

    /// True if the entry at `index` is untouched since creation.
    pub fn is_blank(&self, index: usize) -> bool {
        self.entries
            .get(index)
            .map(|e| *e == Entry::blank(&self.starter_tags))
            .unwrap_or(false)
    }

    /// Appends a blank entry and returns its index.
    pub fn add(&mut self) -> usize {
        self.entries.push(Entry::blank(&self.starter_tags));
        self.entries.len() - 1
    }

    /// Removes the entry at `index`. The last remaining entry is never removed.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if self.entries.len() <= 1 || index >= self.entries.len() {
            debug!(
                "Ignoring removal of entry {} from a collection of {}",
                index,
                self.entries.len()
            );
            return false;
        }
        self.entries.remove(index);
        true
    }

    /// Replaces one field of the entry at `index`.
    ///
    /// Replacing the video also refreshes the entry's display file size.
    pub fn set_field(&mut self, index: usize, field: EntryField) -> Result<(), CollectionError> {
        if let EntryField::Video(Some(file)) = &field {
            self.check_size("video", file, self.limits.max_video_size)?;
        }
        if let EntryField::Thumbnail(Some(file)) = &field {
            self.check_size("thumbnail", file, self.limits.max_thumbnail_size)?;
        }

        let entry = self.entry_mut(index)?;
        match field {
            EntryField::Title(title) => entry.title = title,
            EntryField::DanceStyle(style) => entry.dance_style = style,
            EntryField::Level(level) => entry.level = level,
            EntryField::Video(video) => {
                entry.file_size = video.as_ref().map(|v| format_file_size(v.size()));
                entry.video = video;
            }
            EntryField::Thumbnail(thumbnail) => {
                entry.thumbnail = thumbnail;
                entry.file_size = entry.video.as_ref().map(|v| format_file_size(v.size()));
            }
        }
        Ok(())
    }

    /// Replaces the tag list of the entry at `index` and remembers the tags.
    pub fn set_tags(&mut self, index: usize, tags: TagList) -> Result<(), CollectionError> {
        let entry = self.entry_mut(index)?;
        entry.tags = tags;
        let tags = entry.tags.clone();
        if let Err(e) = self.tag_memory.remember(&tags) {
            warn!("Failed to persist used tags: {:#}", e);
        }
        Ok(())
    }

    /// Adds one tag to the entry at `index`. Returns false if it was blank or present.
    pub fn add_tag(&mut self, index: usize, tag: &str) -> Result<bool, CollectionError> {
        let mut tags = self.entry_ref(index)?.tags.clone();
        if !tags.insert(tag) {
            return Ok(false);
        }
        self.set_tags(index, tags)?;
        Ok(true)
    }

    pub fn remove_tag(&mut self, index: usize, tag: &str) -> Result<bool, CollectionError> {
        let mut tags = self.entry_ref(index)?.tags.clone();
        if !tags.remove(tag) {
            return Ok(false);
        }
        self.set_tags(index, tags)?;
        Ok(true)
    }

    /// Back to a single blank entry.
    pub fn reset(&mut self) {
        self.entries = vec![Entry::blank(&self.starter_tags)];
    }

    /// Drops the entries at `indices`, leaving one blank entry if none remain.
    pub fn remove_many(&mut self, indices: &[usize]) {
        let mut index = 0;
        self.entries.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        if self.entries.is_empty() {
            self.reset();
        }
    }

    fn check_size(
        &self,
        field: &'static str,
        file: &MediaFile,
        limit: u64,
    ) -> Result<(), CollectionError> {
        if file.size() > limit {
            return Err(CollectionError::FileTooLarge {
                field,
                size: file.size(),
                limit_mb: limit / (1024 * 1024),
            });
        }
        Ok(())
    }

    fn entry_ref(&self, index: usize) -> Result<&Entry, CollectionError> {
        let len = self.entries.len();
        self.entries
            .get(index)
            .ok_or(CollectionError::IndexOutOfRange { index, len })
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut Entry, CollectionError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(CollectionError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DanceStyle, Level};

    fn collection() -> EntryCollection {
        EntryCollection::new(Arc::new(TagMemory::in_memory()))
    }

    fn video(size: usize) -> MediaFile {
        MediaFile::new("move.mp4", "video/mp4", vec![0u8; size])
    }

    #[test]
    fn starts_with_one_blank_entry() {
        let c = collection();
        assert_eq!(c.len(), 1);
        assert!(c.is_blank(0));
    }

    #[test]
    fn add_and_remove_keep_at_least_one_entry() {
        let mut c = collection();
        assert_eq!(c.add(), 1);
        c.set_field(1, EntryField::Title("Enchufla".to_string()))
            .unwrap();

        assert!(c.remove_at(0));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(0).unwrap().title, "Enchufla");

        assert!(!c.remove_at(0));
        assert_eq!(c.len(), 1);
        assert!(!c.remove_at(7));
    }

    #[test]
    fn starter_tags_apply_to_new_entries() {
        let starter: TagList = ["salsa"].into_iter().collect();
        let mut c = collection().with_starter_tags(starter.clone());
        let idx = c.add();
        assert_eq!(c.get(0).unwrap().tags, starter);
        assert_eq!(c.get(idx).unwrap().tags, starter);
        assert!(c.is_blank(idx));
    }

    #[test]
    fn setting_video_computes_file_size() {
        let mut c = collection();
        c.set_field(0, EntryField::Video(Some(video(3 * 1024 * 1024))))
            .unwrap();
        assert_eq!(c.get(0).unwrap().file_size.as_deref(), Some("3.00"));

        c.set_field(0, EntryField::Video(None)).unwrap();
        assert_eq!(c.get(0).unwrap().file_size, None);
    }

    #[test]
    fn oversized_media_is_rejected() {
        let mut c = collection().with_limits(MediaLimits {
            max_video_size: 1024 * 1024,
            max_thumbnail_size: 1024 * 1024,
        });
        let err = c
            .set_field(0, EntryField::Video(Some(video(2 * 1024 * 1024))))
            .unwrap_err();
        assert_eq!(
            err,
            CollectionError::FileTooLarge {
                field: "video",
                size: 2 * 1024 * 1024,
                limit_mb: 1,
            }
        );
        assert!(c.get(0).unwrap().video.is_none());
    }

    #[test]
    fn set_field_out_of_range() {
        let mut c = collection();
        let err = c
            .set_field(3, EntryField::Level(Level::new(2)))
            .unwrap_err();
        assert_eq!(err, CollectionError::IndexOutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn tag_edits_are_remembered() {
        let memory = Arc::new(TagMemory::in_memory());
        let mut c = EntryCollection::new(memory.clone());
        assert!(c.add_tag(0, "cross body lead").unwrap());
        assert!(!c.add_tag(0, "cross body lead").unwrap());
        c.set_tags(0, ["shine", "turn"].into_iter().collect())
            .unwrap();

        let remembered = memory.load();
        assert!(remembered.contains("cross body lead"));
        assert!(remembered.contains("shine"));
        assert!(remembered.contains("turn"));

        assert!(c.remove_tag(0, "shine").unwrap());
        assert!(memory.load().contains("shine"));
    }

    #[test]
    fn remove_many_leaves_a_blank_entry_when_emptied() {
        let mut c = collection();
        c.add();
        c.set_field(1, EntryField::DanceStyle(Some(DanceStyle::Bachata)))
            .unwrap();
        c.remove_many(&[0]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(0).unwrap().dance_style, Some(DanceStyle::Bachata));

        c.remove_many(&[0]);
        assert_eq!(c.len(), 1);
        assert!(c.is_blank(0));
    }
}
