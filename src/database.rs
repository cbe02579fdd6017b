//! SQLite durable backend.
//!
//! This module implements the durable side of note storage on SQLite. The
//! database is the authoritative store once it holds any content: a single
//! `notes` table keyed by `id`, an index on `updated_at` for ordered scans,
//! and a `meta` table carrying the schema version.
//!
//! All timestamps are Unix milliseconds (INTEGER).

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::error::{NotesError, NotesResult};
use crate::models::Note;
use crate::store::DurableBackend;

/// Current schema version, recorded in the `meta` table
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    favorite INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes(updated_at);
"#;

/// SQLite-backed implementation of [`DurableBackend`].
///
/// The connection is shared behind a mutex; every trait method takes the
/// lock for the duration of one statement or transaction, so each call is
/// atomic with respect to concurrent readers.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (creating if absent) the database at the given path.
    ///
    /// Idempotent: schema creation uses IF NOT EXISTS throughout, so
    /// reopening an existing database performs no duplicate setup work.
    pub fn open<P: AsRef<Path>>(path: P) -> NotesResult<Self> {
        let conn = Connection::open(&path)
            .map_err(|e| NotesError::unavailable(format!("cannot open database: {}", e)))?;

        // WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| NotesError::unavailable(format!("cannot configure database: {}", e)))?;

        Self::init_schema(&conn)
            .map_err(|e| NotesError::unavailable(format!("cannot initialize schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> NotesResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| NotesError::unavailable(format!("cannot open database: {}", e)))?;
        Self::init_schema(&conn)
            .map_err(|e| NotesError::unavailable(format!("cannot initialize schema: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            r#"
            INSERT INTO meta (key, value)
            VALUES ('schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn conn(&self) -> NotesResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| NotesError::unavailable("database connection lock poisoned"))
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        favorite: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const UPSERT_SQL: &str = r#"
INSERT INTO notes (id, title, content, favorite, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    content = excluded.content,
    favorite = excluded.favorite,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

#[async_trait]
impl DurableBackend for SqliteBackend {
    async fn count(&self) -> NotesResult<u64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .map_err(|e| NotesError::unavailable(format!("cannot count notes: {}", e)))
    }

    async fn read_all(&self) -> NotesResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, title, content, favorite, created_at, updated_at FROM notes")
            .map_err(|e| NotesError::unavailable(format!("cannot read notes: {}", e)))?;

        let notes = stmt
            .query_map([], row_to_note)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| NotesError::unavailable(format!("cannot read notes: {}", e)))?;
        Ok(notes)
    }

    async fn put(&self, note: &Note) -> NotesResult<()> {
        let conn = self.conn()?;
        conn.execute(
            UPSERT_SQL,
            params![
                note.id,
                note.title,
                note.content,
                note.favorite,
                note.created_at,
                note.updated_at
            ],
        )
        .map_err(|e| NotesError::write_failed(&note.id, e.to_string()))?;
        Ok(())
    }

    async fn put_batch(&self, notes: &[Note]) -> NotesResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| NotesError::unavailable(format!("cannot start transaction: {}", e)))?;

        for note in notes {
            tx.execute(
                UPSERT_SQL,
                params![
                    note.id,
                    note.title,
                    note.content,
                    note.favorite,
                    note.created_at,
                    note.updated_at
                ],
            )
            .map_err(|e| NotesError::write_failed(&note.id, e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| NotesError::unavailable(format!("cannot commit batch: {}", e)))
    }

    async fn delete(&self, id: &str) -> NotesResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM notes WHERE id = ?1", params![id])
            .map_err(|e| NotesError::write_failed(id, e.to_string()))?;
        Ok(())
    }
}
