//! In-process state store

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{StateStore, StorageError};

/// State store kept entirely in memory (tests, embedding hosts)
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    global: Mutex<HashMap<String, Value>>,
    secrets: Mutex<HashMap<String, String>>,
    flushes: Mutex<usize>,
}

impl MemoryStateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`StateStore::flush`] has been called
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a secret key is physically present (empty strings included)
    pub fn has_secret_key(&self, key: &str) -> bool {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl StateStore for MemoryStateStore {
    fn get_global_state(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let guard = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set_global_state(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut guard = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_secret(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
