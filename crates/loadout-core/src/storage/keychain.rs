//! OS keychain secret region
//!
//! Wraps another [`StateStore`] for the general region and routes every
//! secret to the platform credential store.

use keyring::Entry;
use serde_json::Value;

use super::{StateStore, StorageError};

/// Keyring service name used when none is given
pub const DEFAULT_SERVICE: &str = "loadout";

/// General state from `inner`, secrets from the OS keyring
pub struct KeyringStateStore<S> {
    inner: S,
    service: String,
}

impl<S: StateStore> KeyringStateStore<S> {
    /// Wrap `inner`, storing secrets under [`DEFAULT_SERVICE`]
    pub fn new(inner: S) -> Self {
        Self::with_service(inner, DEFAULT_SERVICE)
    }

    /// Wrap `inner`, storing secrets under a custom keyring service
    pub fn with_service(inner: S, service: impl Into<String>) -> Self {
        Self {
            inner,
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl<S: StateStore> StateStore for KeyringStateStore<S> {
    fn get_global_state(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get_global_state(key)
    }

    fn set_global_state(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.inner.set_global_state(key, value)
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn delete_secret(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&self) -> Result<(), StorageError> {
        // Keyring writes are synchronous
        self.inner.flush()
    }
}
