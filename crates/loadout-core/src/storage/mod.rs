//! Persistent state stores
//!
//! The profile manager only sees the [`StateStore`] contract: a general
//! region holding JSON values and a secret region holding strings.

pub mod keychain;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use serde_json::Value;
use thiserror::Error;

pub use keychain::KeyringStateStore;
pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Key-value store backing the profile system
pub trait StateStore {
    /// Read a value from the general state region
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn get_global_state(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Write a value to the general state region
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    fn set_global_state(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Read a string from the secret region
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a string to the secret region
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a secret.
    ///
    /// Stores without a delete primitive fall back to writing an empty
    /// string, which readers treat as absent.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    fn delete_secret(&self, key: &str) -> Result<(), StorageError> {
        self.set_secret(key, "")
    }

    /// Make pending writes durable
    ///
    /// # Errors
    /// Returns an error if the backend cannot be synced
    fn flush(&self) -> Result<(), StorageError>;
}
