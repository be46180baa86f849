//! Error types for profile operations

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur during profile operations
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile with the given id
    #[error("Profile {0} not found")]
    NotFound(String),

    /// Another profile already uses this name
    #[error("Profile with name \"{0}\" already exists")]
    DuplicateName(String),

    /// Name failed validation
    #[error("Invalid profile name: {0}")]
    InvalidName(String),

    /// The active profile cannot be deleted
    #[error("Cannot delete active profile")]
    CannotDeleteActive,

    /// The default profile cannot be deleted
    #[error("Cannot delete default profile")]
    CannotDeleteDefault,

    /// The last remaining profile cannot be deleted
    #[error("Cannot delete the last profile")]
    CannotDeleteLast,

    /// No profile envelope has been persisted yet
    #[error("Profile system not initialized")]
    SystemNotInitialized,

    /// Secrets were required but are missing
    #[error("No secrets stored for profile {0}")]
    SecretsNotFound(String),

    /// Import payload is malformed or unsupported
    #[error("Invalid profile import: {0}")]
    ImportInvalid(String),

    /// Legacy configuration could not be migrated
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Configuration or metadata value is out of bounds
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Backing store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProfileError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PROFILE_NOT_FOUND",
            Self::DuplicateName(_) => "PROFILE_DUPLICATE_NAME",
            Self::InvalidName(_) => "PROFILE_INVALID_NAME",
            Self::CannotDeleteActive => "PROFILE_CANNOT_DELETE_ACTIVE",
            Self::CannotDeleteDefault => "PROFILE_CANNOT_DELETE_DEFAULT",
            Self::CannotDeleteLast => "PROFILE_CANNOT_DELETE_LAST",
            Self::SystemNotInitialized => "PROFILE_SYSTEM_NOT_INITIALIZED",
            Self::SecretsNotFound(_) => "PROFILE_SECRETS_NOT_FOUND",
            Self::ImportInvalid(_) => "PROFILE_IMPORT_INVALID",
            Self::MigrationFailed(_) => "PROFILE_MIGRATION_FAILED",
            Self::InvalidConfiguration(_) => "PROFILE_INVALID_CONFIGURATION",
            Self::Storage(_) => "PROFILE_STORAGE_ERROR",
        }
    }
}
