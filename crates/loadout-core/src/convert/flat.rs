//! Flat configuration resolution
//!
//! Produces the single flat object consumed by provider handlers: common
//! settings, secrets and the chosen mode's fields, plus `planMode*`/`actMode*`
//! projections so either mode's provider is visible regardless of which one
//! is current.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::profile::{Mode, ModeConfiguration, ProfileConfiguration, ProfileSecrets};

/// Provider-specific fields re-projected under a mode prefix.
///
/// The first field of each entry is the provider's model id; the entry only
/// applies when that field is set. Add a row to support another provider.
pub const MODE_MODEL_FIELDS: &[(&str, &[&str])] = &[
    ("ollama", &["ollamaModelId"]),
    ("openrouter", &["openRouterModelId", "openRouterModelInfo"]),
    ("openai", &["openAiModelId", "openAiModelInfo"]),
    ("lmstudio", &["lmStudioModelId"]),
    ("litellm", &["liteLlmModelId", "liteLlmModelInfo"]),
    ("requesty", &["requestyModelId", "requestyModelInfo"]),
    ("together", &["togetherModelId"]),
    ("fireworks", &["fireworksModelId"]),
    ("sapaicore", &["sapAiCoreModelId", "sapAiCoreDeploymentId"]),
    ("groq", &["groqModelId", "groqModelInfo"]),
    ("baseten", &["basetenModelId", "basetenModelInfo"]),
    ("huggingface", &["huggingFaceModelId", "huggingFaceModelInfo"]),
    (
        "huawei-cloud-maas",
        &["huaweiCloudMaasModelId", "huaweiCloudMaasModelInfo"],
    ),
    ("oca", &["ocaModelId", "ocaModelInfo"]),
    ("aihubmix", &["aihubmixModelId", "aihubmixModelInfo"]),
    ("hicap", &["hicapModelId", "hicapModelInfo"]),
    ("nousresearch", &["nousResearchModelId"]),
];

/// Fields projected for a provider, if it has an entry
#[must_use]
pub fn model_fields_for(provider: &str) -> Option<&'static [&'static str]> {
    MODE_MODEL_FIELDS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, fields)| *fields)
}

/// `planMode` + `ollamaModelId` -> `planModeOllamaModelId`
#[must_use]
pub fn prefixed_key(mode: Mode, field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", mode.prefix(), first.to_uppercase(), chars.as_str()),
        None => mode.prefix().to_string(),
    }
}

/// Resolve a profile configuration into one flat object for `mode`
#[must_use]
pub fn flatten_configuration(
    config: &ProfileConfiguration,
    secrets: &ProfileSecrets,
    mode: Mode,
) -> Map<String, Value> {
    let mut flat = Map::new();

    if let Some(common) = &config.common {
        flat.extend(to_object(common));
    }

    for (key, value) in secrets.iter() {
        flat.insert(key.to_string(), Value::String(value.to_string()));
    }

    if let Some(current) = config.mode(mode) {
        flat.extend(to_object(current));
    }

    for projected in Mode::ALL {
        if let Some(slice) = config.mode(projected) {
            project_mode(&mut flat, projected, slice);
        }
    }

    // Older call sites read the unprefixed keys
    if let Some(provider) = config.mode(mode).and_then(|m| m.api_provider.as_ref()) {
        flat.insert("apiProvider".to_string(), Value::String(provider.clone()));
        match config.mode(mode).and_then(|m| m.api_model_id.as_ref()) {
            Some(model) => {
                flat.insert("apiModelId".to_string(), Value::String(model.clone()));
            }
            None => {
                flat.remove("apiModelId");
            }
        }
    }

    flat
}

fn project_mode(flat: &mut Map<String, Value>, mode: Mode, slice: &ModeConfiguration) {
    let Some(provider) = &slice.api_provider else {
        return;
    };

    flat.insert(
        prefixed_key(mode, "apiProvider"),
        Value::String(provider.clone()),
    );
    if let Some(model) = &slice.api_model_id {
        flat.insert(prefixed_key(mode, "apiModelId"), Value::String(model.clone()));
    }

    let Some(fields) = model_fields_for(provider) else {
        return;
    };
    let values = to_object(slice);
    if fields.first().map_or(true, |id| !values.contains_key(*id)) {
        return;
    }
    for field in fields {
        if let Some(value) = values.get(*field) {
            flat.insert(prefixed_key(mode, field), value.clone());
        }
    }
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize configuration slice");
            Map::new()
        }
    }
}
