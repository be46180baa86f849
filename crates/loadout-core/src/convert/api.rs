//! Typed provider configuration
//!
//! Maps a profile's delta configuration and resolved secrets onto the
//! `{options, secrets}` shape used across the extension boundary.

use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::flat::prefixed_key;
use crate::profile::{
    CommonConfiguration, Mode, ModeConfiguration, ProfileConfiguration, ProfileSecrets,
    OPENAI_COMPATIBLE_SECRET_PREFIX,
};

/// Provider identifiers understood by the handler layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiProvider {
    Anthropic,
    Openrouter,
    Bedrock,
    Vertex,
    Openai,
    Ollama,
    Lmstudio,
    Gemini,
    OpenaiNative,
    Requesty,
    Together,
    Deepseek,
    Qwen,
    Doubao,
    Mistral,
    VscodeLm,
    Cline,
    Litellm,
    Nebius,
    Fireworks,
    Asksage,
    Xai,
    Sambanova,
    Cerebras,
    Groq,
    Sapaicore,
    ClaudeCode,
    Moonshot,
    Huggingface,
    HuaweiCloudMaas,
    Baseten,
    Zai,
    VercelAiGateway,
    QwenCode,
    Dify,
    Oca,
    Minimax,
    Hicap,
    Aihubmix,
    Nousresearch,
}

/// Profile provider string -> provider
const PROVIDER_NAMES: &[(&str, ApiProvider)] = &[
    ("anthropic", ApiProvider::Anthropic),
    ("openrouter", ApiProvider::Openrouter),
    ("bedrock", ApiProvider::Bedrock),
    ("vertex", ApiProvider::Vertex),
    ("openai", ApiProvider::Openai),
    ("ollama", ApiProvider::Ollama),
    ("lmstudio", ApiProvider::Lmstudio),
    ("gemini", ApiProvider::Gemini),
    ("openai-native", ApiProvider::OpenaiNative),
    ("requesty", ApiProvider::Requesty),
    ("together", ApiProvider::Together),
    ("deepseek", ApiProvider::Deepseek),
    ("qwen", ApiProvider::Qwen),
    ("doubao", ApiProvider::Doubao),
    ("mistral", ApiProvider::Mistral),
    ("vscode-lm", ApiProvider::VscodeLm),
    ("cline", ApiProvider::Cline),
    ("litellm", ApiProvider::Litellm),
    ("nebius", ApiProvider::Nebius),
    ("fireworks", ApiProvider::Fireworks),
    ("asksage", ApiProvider::Asksage),
    ("xai", ApiProvider::Xai),
    ("sambanova", ApiProvider::Sambanova),
    ("cerebras", ApiProvider::Cerebras),
    ("groq", ApiProvider::Groq),
    ("sapaicore", ApiProvider::Sapaicore),
    ("claude-code", ApiProvider::ClaudeCode),
    ("moonshot", ApiProvider::Moonshot),
    ("huggingface", ApiProvider::Huggingface),
    ("huawei-cloud-maas", ApiProvider::HuaweiCloudMaas),
    ("baseten", ApiProvider::Baseten),
    ("zai", ApiProvider::Zai),
    ("vercel-ai-gateway", ApiProvider::VercelAiGateway),
    ("qwen-code", ApiProvider::QwenCode),
    ("dify", ApiProvider::Dify),
    ("oca", ApiProvider::Oca),
    ("minimax", ApiProvider::Minimax),
    ("hicap", ApiProvider::Hicap),
    ("aihubmix", ApiProvider::Aihubmix),
    ("nousresearch", ApiProvider::Nousresearch),
];

impl ApiProvider {
    /// Look up a provider by its profile name, case-insensitively
    ///
    /// Unrecognized names are unmapped (`None`), not an error.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        PROVIDER_NAMES
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, p)| *p)
    }

    /// Profile name of this provider (`openai-native`, ...)
    #[must_use]
    pub fn name(self) -> &'static str {
        PROVIDER_NAMES
            .iter()
            .find(|(_, p)| *p == self)
            .map_or("", |(n, _)| *n)
    }
}

impl std::fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One mode's provider selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeOptions {
    /// Mapped provider; `None` when unset or unrecognized
    pub api_provider: Option<ApiProvider>,
    /// Every other mode field, copied verbatim
    pub settings: ModeConfiguration,
}

impl ModeOptions {
    fn from_configuration(mode: &ModeConfiguration) -> Self {
        let mut settings = mode.clone();
        let api_provider = settings
            .api_provider
            .take()
            .and_then(|p| ApiProvider::from_name(&p));
        settings.extra.clear();
        Self {
            api_provider,
            settings,
        }
    }
}

/// Non-secret options; serializes flat with `planMode*`/`actMode*` keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiOptions {
    pub common: CommonConfiguration,
    pub plan_mode: Option<ModeOptions>,
    pub act_mode: Option<ModeOptions>,
}

impl ApiOptions {
    /// Options for a mode
    #[must_use]
    pub fn mode(&self, mode: Mode) -> Option<&ModeOptions> {
        match mode {
            Mode::Plan => self.plan_mode.as_ref(),
            Mode::Act => self.act_mode.as_ref(),
        }
    }
}

impl Serialize for ApiOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Map<String, Value> = match serde_json::to_value(&self.common) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(S::Error::custom(e)),
        };

        for mode in Mode::ALL {
            let Some(options) = self.mode(mode) else {
                continue;
            };
            if let Some(provider) = options.api_provider {
                let value = serde_json::to_value(provider).map_err(S::Error::custom)?;
                entries.insert(prefixed_key(mode, "apiProvider"), value);
            }
            if let Value::Object(fields) =
                serde_json::to_value(&options.settings).map_err(S::Error::custom)?
            {
                for (field, value) in fields {
                    entries.insert(prefixed_key(mode, &field), value);
                }
            }
        }

        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in &entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Secrets forwarded to provider handlers
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSecrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_router_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_native_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_seek_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesty_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub together_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fireworks_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qwen_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doubao_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistral_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moonshot_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asksage_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sambanova_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cerebras_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nebius_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugging_face_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huawei_cloud_maas_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseten_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vercel_ai_gateway_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dify_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimax_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hicap_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nous_research_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lite_llm_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aihubmix_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cline_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_code_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qwen_code_oauth_path: Option<String>,

    /// Keys for OpenAI-compatible custom models, by model id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub open_ai_compatible_api_keys: BTreeMap<String, String>,
}

impl ApiSecrets {
    /// Pick the handler-facing secrets out of a profile's secret map
    #[must_use]
    pub fn from_profile_secrets(secrets: &ProfileSecrets) -> Self {
        let mut named = Map::new();
        let mut custom = BTreeMap::new();
        for (key, value) in secrets.iter() {
            match key.strip_prefix(OPENAI_COMPATIBLE_SECRET_PREFIX) {
                Some(model_id) => {
                    custom.insert(model_id.to_string(), value.to_string());
                }
                None => {
                    named.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }

        // Unknown keys are ignored; every known field is an optional string
        let mut api_secrets: Self = match serde_json::from_value(Value::Object(named)) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to map profile secrets");
                Self::default()
            }
        };
        api_secrets.open_ai_compatible_api_keys = custom;
        api_secrets
    }
}

impl std::fmt::Debug for ApiSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        f.debug_struct("ApiSecrets")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

/// Handler-facing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiConfiguration {
    pub options: ApiOptions,
    pub secrets: ApiSecrets,
}

/// Convert a profile configuration and its secrets
#[must_use]
pub fn to_api_configuration(
    config: &ProfileConfiguration,
    secrets: &ProfileSecrets,
) -> ApiConfiguration {
    let mut common = config.common.clone().unwrap_or_default();
    common.extra.clear();

    ApiConfiguration {
        options: ApiOptions {
            common,
            plan_mode: config.plan_mode.as_ref().map(ModeOptions::from_configuration),
            act_mode: config.act_mode.as_ref().map(ModeOptions::from_configuration),
        },
        secrets: ApiSecrets::from_profile_secrets(secrets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_lookup_is_case_insensitive() {
        assert_eq!(ApiProvider::from_name("Ollama"), Some(ApiProvider::Ollama));
        assert_eq!(
            ApiProvider::from_name("OPENAI-NATIVE"),
            Some(ApiProvider::OpenaiNative)
        );
        assert_eq!(ApiProvider::from_name("not-a-provider"), None);
    }

    #[test]
    fn test_provider_names_round_trip() {
        for (name, provider) in PROVIDER_NAMES {
            assert_eq!(provider.name(), *name);
            assert_eq!(ApiProvider::from_name(name), Some(*provider));
        }
    }

    #[test]
    fn test_provider_wire_name() {
        let json = serde_json::to_value(ApiProvider::HuaweiCloudMaas).unwrap();
        assert_eq!(json, Value::String("HUAWEI_CLOUD_MAAS".to_string()));
    }

    #[test]
    fn test_debug_does_not_print_secret_values() {
        let secrets: ProfileSecrets = [("apiKey", "sk-very-secret")].into_iter().collect();
        let api = ApiSecrets::from_profile_secrets(&secrets);
        let debug = format!("{api:?}");
        assert!(debug.contains("apiKey"));
        assert!(!debug.contains("sk-very-secret"));
    }
}
