use chrono::Utc;
use rusqlite::{params, Connection, Result};
use std::path::Path;
use tracing::debug;

use crate::error::StorageError;
use crate::state::SnapshotSink;

pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub key: String,
    pub bytes: i64,
    pub saved_at: String,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                saved_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_snapshot(&self, key: &str) -> Result<Option<String>> {
        let body = self.conn.query_row(
            "SELECT body FROM snapshots WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match body {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Whole-document replace; there is no partial update
    pub fn save_snapshot(&self, key: &str, body: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO snapshots (key, body, saved_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET body = excluded.body, saved_at = excluded.saved_at
            "#,
            params![key, body, Utc::now().to_rfc3339()],
        )?;
        debug!(key, bytes = body.len(), "saved snapshot");
        Ok(())
    }

    pub fn snapshot_info(&self, key: &str) -> Result<Option<SnapshotInfo>> {
        let info = self.conn.query_row(
            "SELECT key, length(CAST(body AS BLOB)), saved_at FROM snapshots WHERE key = ?1",
            params![key],
            |row| {
                Ok(SnapshotInfo {
                    key: row.get(0)?,
                    bytes: row.get(1)?,
                    saved_at: row.get(2)?,
                })
            },
        );

        match info {
            Ok(i) => Ok(Some(i)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Bind this database to one storage key.
    pub fn sink(&self, key: impl Into<String>) -> KeyedSnapshot<'_> {
        KeyedSnapshot {
            db: self,
            key: key.into(),
        }
    }
}

pub struct KeyedSnapshot<'a> {
    db: &'a Database,
    key: String,
}

impl SnapshotSink for KeyedSnapshot<'_> {
    fn load(&self) -> std::result::Result<Option<String>, StorageError> {
        Ok(self.db.load_snapshot(&self.key)?)
    }

    fn save(&self, body: &str) -> std::result::Result<(), StorageError> {
        Ok(self.db.save_snapshot(&self.key, body)?)
    }
}
