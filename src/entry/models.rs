//! Draft entry data model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dance style of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanceStyle {
    CubanSalsa,
    LinearSalsa,
    Bachata,
}

impl DanceStyle {
    pub const ALL: [DanceStyle; 3] = [
        DanceStyle::CubanSalsa,
        DanceStyle::LinearSalsa,
        DanceStyle::Bachata,
    ];

    /// Wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DanceStyle::CubanSalsa => "cuban_salsa",
            DanceStyle::LinearSalsa => "linear_salsa",
            DanceStyle::Bachata => "bachata",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DanceStyle::CubanSalsa => "Cuban Salsa",
            DanceStyle::LinearSalsa => "Linear Salsa",
            DanceStyle::Bachata => "Bachata",
        }
    }
}

impl FromStr for DanceStyle {
    type Err = String;

    /// Accepts both the wire value and the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DanceStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s || style.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown dance style: {}", s))
    }
}

impl fmt::Display for DanceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difficulty level, 1 (beginner) through 5 (professional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Level(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "1 - Beginner",
            2 => "2 - Intermediate",
            3 => "3 - Advanced",
            4 => "4 - Expert",
            _ => "5 - Professional",
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::new(value).ok_or_else(|| format!("Level must be between 1 and 5, got {}", value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid level: {}", s))?;
        Level::try_from(value)
    }
}

/// A finished media file, ready to be stored.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// Media payloads can be huge, keep them out of logs.
impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Ordered tag list without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag, trimmed. Returns false for blank or already present tags.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        tags.iter().map(String::as_str).collect()
    }
}

impl From<TagList> for Vec<String> {
    fn from(tags: TagList) -> Self {
        tags.0
    }
}

impl<'a> FromIterator<&'a str> for TagList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tags = TagList::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One draft dance move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub dance_style: Option<DanceStyle>,
    pub level: Option<Level>,
    pub tags: TagList,
    pub video: Option<MediaFile>,
    pub thumbnail: Option<MediaFile>,
    /// Display-only video size, see [`crate::media::format_file_size`].
    pub file_size: Option<String>,
}

impl Entry {
    pub fn blank(starter_tags: &TagList) -> Self {
        Self {
            tags: starter_tags.clone(),
            ..Default::default()
        }
    }

    /// Required fields that are still missing, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.dance_style.is_none() {
            missing.push("dance style");
        }
        if self.level.is_none() {
            missing.push("level");
        }
        if self.video.is_none() {
            missing.push("video");
        }
        if self.thumbnail.is_none() {
            missing.push("thumbnail");
        }
        missing
    }

    pub fn is_submittable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Borrowed view with every required field resolved, if submittable.
    pub fn as_submittable(&self) -> Option<SubmittableEntry<'_>> {
        Some(SubmittableEntry {
            title: self.title.trim(),
            dance_style: self.dance_style?,
            level: self.level?,
            tags: &self.tags,
            video: self.video.as_ref()?,
            thumbnail: self.thumbnail.as_ref()?,
            file_size: self.file_size.as_deref(),
        })
        .filter(|e| !e.title.is_empty())
    }
}

/// An entry whose required fields are all present.
#[derive(Debug, Clone, Copy)]
pub struct SubmittableEntry<'a> {
    pub title: &'a str,
    pub dance_style: DanceStyle,
    pub level: Level,
    pub tags: &'a TagList,
    pub video: &'a MediaFile,
    pub thumbnail: &'a MediaFile,
    pub file_size: Option<&'a str>,
}

/// A single field replacement for [`super::EntryCollection::set_field`].
#[derive(Debug, Clone)]
pub enum EntryField {
    Title(String),
    DanceStyle(Option<DanceStyle>),
    Level(Option<Level>),
    Video(Option<MediaFile>),
    Thumbnail(Option<MediaFile>),
}

impl EntryField {
    pub fn name(&self) -> &'static str {
        match self {
            EntryField::Title(_) => "title",
            EntryField::DanceStyle(_) => "dance style",
            EntryField::Level(_) => "level",
            EntryField::Video(_) => "video",
            EntryField::Thumbnail(_) => "thumbnail",
        }
    }
}
