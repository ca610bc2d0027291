//! SQLite-backed progress store.
//!
//! A single `kv` table maps store keys to blobs. Each write runs in its
//! own transaction so an interrupted write leaves the previous value.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, ProgressStore};
use crate::error::{CoreError, DatabaseError, StoreError};

/// SQLite database for the progress store.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `<data_dir>/goalr.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("goalr.db");
        Ok(Self::open_at(&path).map_err(StoreError::from)?)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "opened progress database");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, path: None })
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a value from the kv table.
    pub fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Replace a value in the kv table atomically.
    pub fn kv_set(&mut self, key: &str, value: &[u8]) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl ProgressStore for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        Ok(self.kv_set(key, value)?)
    }
}
