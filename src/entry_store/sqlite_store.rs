use super::models::EntryRecord;
use super::schema::ENTRIES_VERSIONED_SCHEMAS;
use crate::entry::{DanceStyle, Level, TagList};
use crate::sqlite_persistence::{migrate_if_needed, open_read_write};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Document side of the local store: entry records keyed by id, unique on title.
#[derive(Clone)]
pub struct SqliteEntryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        info!("Opening entries database at {:?}", path);
        let mut conn = open_read_write(path)?;
        migrate_if_needed(&mut conn, ENTRIES_VERSIONED_SCHEMAS)
            .context("Failed to prepare entries database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn title_exists(&self, title: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let found = conn
            .query_row(
                "SELECT 1 FROM entries WHERE title = ?1",
                params![title],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Inserts `record`. Returns false, writing nothing, if its title is taken.
    pub fn insert(&self, record: &EntryRecord) -> Result<bool> {
        let tags = serde_json::to_string(record.tags.as_slice())?;
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO entries (id, title, dance_style, level, tags, video_key, thumbnail_key, file_size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.title,
                record.dance_style.as_str(),
                record.level.value(),
                tags,
                record.video_key,
                record.thumbnail_key,
                record.file_size,
                record.created_at,
            ],
        );
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(false)
            }
            Err(e) => Err(e).context("Failed to insert entry"),
        }
    }

    pub fn get_by_title(&self, title: &str) -> Result<Option<EntryRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT * FROM entries WHERE title = ?1",
                params![title],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Stored entries, newest first.
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<EntryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM entries ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
        )?;
        let records = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<EntryRecord> {
        let style: String = row.get("dance_style")?;
        let dance_style = style.parse::<DanceStyle>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        let level: u8 = row.get("level")?;
        let level = Level::try_from(level).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Integer,
                e.into(),
            )
        })?;
        let tags: String = row.get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags).unwrap_or_default();

        Ok(EntryRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            dance_style,
            level,
            tags: TagList::from(tags),
            video_key: row.get("video_key")?,
            thumbnail_key: row.get("thumbnail_key")?,
            file_size: row.get("file_size")?,
            created_at: row.get("created_at")?,
        })
    }
}
