//! Profile export/import envelope
//!
//! This module handles serializing a profile (optionally with its secrets)
//! to a portable JSON document and validating such documents on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Profile, ProfileSecrets};
use crate::error::{ProfileError, ProfileResult};

/// Version of the export format
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Exported profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileExport {
    /// Format version for future compatibility
    pub version: u32,
    /// When exported
    pub exported_at: DateTime<Utc>,
    /// The profile as it was stored
    pub profile: Profile,
    /// Secrets, only when explicitly requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<ProfileSecrets>,
}

impl ProfileExport {
    /// Wrap a profile for export
    #[must_use]
    pub fn new(profile: Profile, secrets: Option<ProfileSecrets>) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            profile,
            secrets,
        }
    }

    /// Serialize as pretty JSON
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the profile cannot be serialized
    pub fn to_json(&self) -> ProfileResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProfileError::InvalidConfiguration(format!("failed to serialize export: {e}")))
    }

    /// Parse and validate an export document
    ///
    /// # Errors
    /// Returns `ImportInvalid` if the text is not JSON, is missing required
    /// fields, or carries an unsupported version
    pub fn parse(json: &str) -> ProfileResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ProfileError::ImportInvalid(format!("not valid JSON: {e}")))?;

        let Value::Object(map) = &value else {
            return Err(ProfileError::ImportInvalid(
                "export must be a JSON object".to_string(),
            ));
        };
        for field in ["version", "exportedAt", "profile"] {
            if !map.contains_key(field) {
                return Err(ProfileError::ImportInvalid(format!("missing field `{field}`")));
            }
        }

        let export: ProfileExport = serde_json::from_value(value)
            .map_err(|e| ProfileError::ImportInvalid(e.to_string()))?;

        if export.version == 0 || export.version > EXPORT_FORMAT_VERSION {
            return Err(ProfileError::ImportInvalid(format!(
                "unsupported export format version: {}",
                export.version
            )));
        }

        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_omitted_unless_present() {
        let export = ProfileExport::new(Profile::new("work".to_string(), None), None);
        let json = export.to_json().unwrap();
        assert!(!json.contains("secrets"));
        assert!(json.contains("exportedAt"));
    }

    #[test]
    fn test_parse_rejects_missing_profile() {
        let err = ProfileExport::parse(r#"{"version":1,"exportedAt":"2024-01-01T00:00:00Z"}"#)
            .unwrap_err();
        assert_eq!(err.code(), "PROFILE_IMPORT_INVALID");
    }

    #[test]
    fn test_parse_rejects_future_version() {
        let mut export = ProfileExport::new(Profile::new("work".to_string(), None), None);
        export.version = EXPORT_FORMAT_VERSION + 1;
        let json = serde_json::to_string(&export).unwrap();
        assert!(matches!(
            ProfileExport::parse(&json),
            Err(ProfileError::ImportInvalid(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ProfileExport::parse("not json").is_err());
        assert!(ProfileExport::parse("[1,2,3]").is_err());
    }
}
