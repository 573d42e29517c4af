//! Draft dance move entries and the form's entry collection.

mod collection;
mod models;

pub use collection::{CollectionError, EntryCollection};
pub use models::{
    DanceStyle, Entry, EntryField, Level, MediaFile, SubmittableEntry, TagList,
};
