//! Legacy flat configuration -> profile conversion
//!
//! The legacy shape is one flat object mixing secrets, `planMode*`/`actMode*`
//! prefixed fields and shared settings. Partitioning is purely syntactic.

use serde_json::{Map, Value};

use super::{Mode, ProfileConfiguration, ProfileSecrets};
use crate::error::{ProfileError, ProfileResult};

/// Name of the profile created by migration
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Description given to the migrated profile
pub const MIGRATED_DESCRIPTION: &str = "Migrated from previous configuration";

/// Legacy keys holding sensitive values
pub const LEGACY_SECRET_KEYS: &[&str] = &[
    "apiKey",
    "awsAccessKey",
    "awsSecretKey",
    "awsSessionToken",
    "awsBedrockApiKey",
    "openRouterApiKey",
    "openAiApiKey",
    "geminiApiKey",
    "openAiNativeApiKey",
    "ollamaApiKey",
    "deepSeekApiKey",
    "requestyApiKey",
    "togetherApiKey",
    "fireworksApiKey",
    "qwenApiKey",
    "doubaoApiKey",
    "mistralApiKey",
    "moonshotApiKey",
    "asksageApiKey",
    "xaiApiKey",
    "sambanovaApiKey",
    "cerebrasApiKey",
    "groqApiKey",
    "nebiusApiKey",
    "huggingFaceApiKey",
    "huaweiCloudMaasApiKey",
    "basetenApiKey",
    "vercelAiGatewayApiKey",
    "difyApiKey",
    "minimaxApiKey",
    "zaiApiKey",
    "hicapApiKey",
    "nousResearchApiKey",
    "liteLlmApiKey",
    "clineAccountId",
    "authNonce",
    "sapAiCoreClientId",
    "sapAiCoreClientSecret",
    "aihubmixApiKey",
];

/// Whether a legacy key is stored as a secret
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    LEGACY_SECRET_KEYS.contains(&key)
}

/// Legacy keys sorted into their destination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyPartition {
    pub common: Map<String, Value>,
    pub plan_mode: Map<String, Value>,
    pub act_mode: Map<String, Value>,
    pub secrets: ProfileSecrets,
}

/// Strip a mode prefix and lower-case the next character
///
/// `planModeApiProvider` -> `Some((Plan, "apiProvider"))`
#[must_use]
pub fn split_mode_key(key: &str) -> Option<(Mode, String)> {
    Mode::ALL.into_iter().find_map(|mode| {
        let rest = key.strip_prefix(mode.prefix())?;
        let mut chars = rest.chars();
        let first = chars.next()?;
        Some((mode, first.to_lowercase().chain(chars).collect()))
    })
}

/// Sort legacy keys into secrets, mode slices and common settings
///
/// Null values are treated as absent. Unknown keys land in `common`.
#[must_use]
pub fn partition_legacy_config(legacy: &Map<String, Value>) -> LegacyPartition {
    let mut partition = LegacyPartition::default();

    for (key, value) in legacy {
        if value.is_null() {
            continue;
        }

        if is_secret_key(key) {
            match value {
                Value::String(s) => {
                    partition.secrets.insert(key.clone(), s.clone());
                }
                other => {
                    tracing::warn!(key = %key, kind = json_kind(other), "skipping non-string legacy secret");
                }
            }
            continue;
        }

        if let Some((mode, field)) = split_mode_key(key) {
            tracing::debug!(key = %key, mode = %mode, field = %field, "migrating mode field");
            let slice = match mode {
                Mode::Plan => &mut partition.plan_mode,
                Mode::Act => &mut partition.act_mode,
            };
            slice.insert(field, value.clone());
            continue;
        }

        // A bare `planMode`/`actMode` key has no field to map to
        if Mode::ALL.iter().any(|m| key == m.prefix()) {
            continue;
        }

        partition.common.insert(key.clone(), value.clone());
    }

    partition
}

/// Build the profile configuration and secrets from a legacy object
///
/// A known field with an unexpected JSON type is carried over verbatim in
/// the slice's `extra` map.
///
/// # Errors
/// Returns `MigrationFailed` if `legacy` is not an object
pub fn migrate_legacy_config(legacy: &Value) -> ProfileResult<(ProfileConfiguration, ProfileSecrets)> {
    let Value::Object(map) = legacy else {
        return Err(ProfileError::MigrationFailed(format!(
            "legacy configuration must be an object, got {}",
            json_kind(legacy)
        )));
    };

    let partition = partition_legacy_config(map);
    let configuration = ProfileConfiguration {
        plan_mode: slice_from_map(partition.plan_mode, "planMode")?,
        act_mode: slice_from_map(partition.act_mode, "actMode")?,
        common: slice_from_map(partition.common, "common")?,
    };

    Ok((configuration, partition.secrets))
}

fn slice_from_map<T: serde::de::DeserializeOwned>(
    map: Map<String, Value>,
    slice: &str,
) -> ProfileResult<Option<T>> {
    if map.is_empty() {
        return Ok(None);
    }
    serde_json::from_value(Value::Object(map))
        .map(Some)
        .map_err(|e| ProfileError::MigrationFailed(format!("invalid {slice} field: {e}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_mode_key() {
        assert_eq!(
            split_mode_key("planModeApiProvider"),
            Some((Mode::Plan, "apiProvider".to_string()))
        );
        assert_eq!(
            split_mode_key("actModeOllamaModelId"),
            Some((Mode::Act, "ollamaModelId".to_string()))
        );
        assert_eq!(split_mode_key("planMode"), None);
        assert_eq!(split_mode_key("awsRegion"), None);
    }

    #[test]
    fn test_partition_routes_each_bucket() {
        let legacy = json!({
            "apiKey": "sk-ant",
            "planModeApiProvider": "ollama",
            "actModeApiModelId": "claude-sonnet",
            "awsRegion": "us-east-1",
            "somethingNew": [1, 2],
            "ollamaBaseUrl": null
        });
        let Value::Object(map) = legacy else { unreachable!() };
        let p = partition_legacy_config(&map);

        assert_eq!(p.secrets.get("apiKey"), Some("sk-ant"));
        assert_eq!(p.plan_mode.get("apiProvider"), Some(&json!("ollama")));
        assert_eq!(p.act_mode.get("apiModelId"), Some(&json!("claude-sonnet")));
        assert_eq!(p.common.get("awsRegion"), Some(&json!("us-east-1")));
        assert_eq!(p.common.get("somethingNew"), Some(&json!([1, 2])));
        assert!(!p.common.contains_key("ollamaBaseUrl"));
        assert!(!p.common.contains_key("apiKey"));
    }

    #[test]
    fn test_migrate_rejects_non_object() {
        let err = migrate_legacy_config(&json!("nope")).unwrap_err();
        assert_eq!(err.code(), "PROFILE_MIGRATION_FAILED");
    }

    #[test]
    fn test_migrate_keeps_mistyped_known_field() {
        let (config, secrets) = migrate_legacy_config(&json!({
            "apiKey": "sk",
            "planModeApiProvider": "ollama",
            "planModeThinkingBudgetTokens": 1024.5,
            "awsRegion": "us-east-1",
            "requestTimeoutMs": "soon"
        }))
        .unwrap();

        let plan = config.plan_mode.unwrap();
        assert_eq!(plan.api_provider.as_deref(), Some("ollama"));
        assert_eq!(plan.thinking_budget_tokens, None);
        assert_eq!(plan.extra.get("thinkingBudgetTokens"), Some(&json!(1024.5)));

        let common = config.common.unwrap();
        assert_eq!(common.aws_region.as_deref(), Some("us-east-1"));
        assert_eq!(common.request_timeout_ms, None);
        assert_eq!(common.extra.get("requestTimeoutMs"), Some(&json!("soon")));
        assert_eq!(secrets.get("apiKey"), Some("sk"));
    }
}
