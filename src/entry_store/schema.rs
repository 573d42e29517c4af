//! SQLite schema of the entries database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 0 - Entries
// =============================================================================

/// Entries table, one row per stored dance move. `tags` is a JSON list.
const ENTRIES_TABLE_V0: Table = Table {
    name: "entries",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("dance_style", &SqlType::Text, non_null = true),
        sqlite_column!("level", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "tags",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("video_key", &SqlType::Text, non_null = true),
        sqlite_column!("thumbnail_key", &SqlType::Text, non_null = true),
        sqlite_column!("file_size", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_entries_created_at", "created_at")],
};

pub const ENTRIES_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ENTRIES_TABLE_V0],
    migration: None,
}];
