//! Runtime settings
//!
//! The data directory comes from `LOADOUT_HOME`, falling back to
//! `~/.loadout`. An optional `config.toml` inside it overrides the defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Env var overriding the data directory
pub const HOME_ENV: &str = "LOADOUT_HOME";

/// Env var holding a tracing filter directive
pub const LOG_ENV: &str = "LOADOUT_LOG";

/// Settings file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Errors loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where profile secrets are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// Alongside general state in the database
    #[default]
    Sqlite,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    log_level: String,
    database: PathBuf,
    secret_backend: SecretBackend,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            database: PathBuf::from("loadout.db"),
            secret_backend: SecretBackend::default(),
        }
    }
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Default tracing filter when `LOADOUT_LOG` is unset
    pub log_level: String,
    /// Database file; relative paths are under `data_dir`
    pub database: PathBuf,
    pub secret_backend: SecretBackend,
}

impl Settings {
    /// Load settings for the current environment
    ///
    /// # Errors
    /// Returns an error if no data directory can be determined or the
    /// settings file is unreadable
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_data_dir(default_data_dir()?)
    }

    /// Load settings rooted at `data_dir`
    ///
    /// # Errors
    /// Returns an error if the settings file exists but cannot be read or parsed
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        let file = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            data_dir,
            log_level: file.log_level,
            database: file.database,
            secret_backend: file.secret_backend,
        })
    }

    /// Absolute path of the database file
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            self.data_dir.join(&self.database)
        }
    }

    /// Path of the settings file
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

/// Data directory: `LOADOUT_HOME` or `~/.loadout`
///
/// # Errors
/// Returns `NoHomeDir` if neither is available
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".loadout"))
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::from_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.secret_backend, SecretBackend::Sqlite);
        assert_eq!(settings.database_path(), dir.path().join("loadout.db"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "log_level = \"debug\"\nsecret_backend = \"keyring\"\n",
        )
        .unwrap();

        let settings = Settings::from_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.secret_backend, SecretBackend::Keyring);
        assert!(settings.database_path().starts_with(dir.path()));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "colour = \"red\"\n").unwrap();
        assert!(matches!(
            Settings::from_data_dir(dir.path().to_path_buf()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
