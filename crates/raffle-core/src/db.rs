// SQLite-backed snapshot store.
//
// The database file plays the role of device-wide local storage: every
// raffle process on the machine opens the same file and reads/writes the
// same row.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::store::{SnapshotStore, SNAPSHOT_KEY};

/// Snapshot store persisted in a single key-value SQLite table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the table exists.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        // WAL lets a reader in one process proceed while another writes;
        // busy_timeout makes concurrent writers wait instead of failing.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS raffle_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

impl SnapshotStore for SqliteStore {
    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        let conn = self.conn();
        let value = conn
            .query_row(
                "SELECT value FROM raffle_state WHERE key = ?1",
                params![SNAPSHOT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_raw(&self, json: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO raffle_state (key, value) VALUES (?1, ?2)",
            params![SNAPSHOT_KEY, json],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute("DELETE FROM raffle_state", [])?;
        Ok(())
    }
}
