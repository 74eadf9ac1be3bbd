use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::store::LinkStore;
use crate::error::CastgateError;
use crate::models::LinkEntry;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS links (
    id               TEXT PRIMARY KEY,
    original_link    TEXT NOT NULL,
    unrestricted_url TEXT NOT NULL,
    generated_at     TEXT NOT NULL,
    filename         TEXT NOT NULL,
    manually_added   INTEGER NOT NULL,
    filesize         INTEGER NOT NULL DEFAULT 0
);
";

/// Durable keyed store for link entries.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, CastgateError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CastgateError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl LinkStore for SqliteStore {
    fn get(&mut self, id: &str) -> Result<Option<LinkEntry>, CastgateError> {
        self.conn
            .query_row(
                "SELECT original_link, unrestricted_url, generated_at, filename,
                 manually_added, filesize
                 FROM links WHERE id = ?1",
                params![id],
                |row| Ok(row_to_entry(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    fn put(&mut self, id: &str, entry: &LinkEntry) -> Result<(), CastgateError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO links
             (id, original_link, unrestricted_url, generated_at, filename,
              manually_added, filesize)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                entry.original_link,
                entry.unrestricted_url,
                entry.generated_at.to_rfc3339(),
                entry.filename,
                entry.manually_added,
                entry.filesize,
            ],
        )?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<(), CastgateError> {
        self.conn.execute("DELETE FROM links WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn entries(&mut self) -> Result<Vec<(String, LinkEntry)>, CastgateError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, original_link, unrestricted_url, generated_at, filename,
             manually_added, filesize
             FROM links",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok((id, row_to_entry_offset(row, 1)))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

fn row_to_entry(row: &Row) -> LinkEntry {
    row_to_entry_offset(row, 0)
}

fn row_to_entry_offset(row: &Row, base: usize) -> LinkEntry {
    LinkEntry {
        original_link: row.get(base).unwrap_or_default(),
        unrestricted_url: row.get(base + 1).unwrap_or_default(),
        generated_at: row
            .get::<_, String>(base + 2)
            .ok()
            .map(|s| parse_datetime(&s))
            .unwrap_or_default(),
        filename: row.get(base + 3).unwrap_or_default(),
        manually_added: row.get(base + 4).unwrap_or_default(),
        filesize: row.get(base + 5).unwrap_or_default(),
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
