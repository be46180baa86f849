//! SQLite-backed state store

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{migrations, StateStore, StorageError};

/// State store persisted in a single SQLite database
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open or create a database at the given path
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        // NORMAL synchronous is safe with WAL; flush() checkpoints explicitly
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing)
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }
}

impl StateStore for SqliteStateStore {
    fn get_global_state(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM global_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn set_global_state(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let json = serde_json::to_string(&value)?;
        self.conn.execute(
            r"
            INSERT INTO global_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM secrets WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r"
            INSERT INTO secrets (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_secret(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM secrets WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        // The pragma reports a (busy, log, checkpointed) row; only success matters
        self.conn
            .query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_global_state_upsert() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.set_global_state("k", json!({"a": 1})).unwrap();
        store.set_global_state("k", json!({"a": 2})).unwrap();
        assert_eq!(store.get_global_state("k").unwrap(), Some(json!({"a": 2})));
        assert_eq!(store.get_global_state("missing").unwrap(), None);
    }

    #[test]
    fn test_delete_secret_removes_row() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.set_secret("s", "value").unwrap();
        store.delete_secret("s").unwrap();
        assert_eq!(store.get_secret("s").unwrap(), None);
    }

    #[test]
    fn test_flush_on_memory_database() {
        let store = SqliteStateStore::in_memory().unwrap();
        assert!(store.flush().is_ok());
    }
}
