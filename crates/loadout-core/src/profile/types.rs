//! Profile types

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current schema version of [`ProfileSystemState`]
pub const STATE_VERSION: u32 = 1;

/// Operating mode a configuration slice applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Planning mode
    Plan,
    /// Acting mode
    Act,
}

impl Mode {
    /// Both modes, plan first
    pub const ALL: [Mode; 2] = [Mode::Plan, Mode::Act];

    /// Key prefix used by flat configurations (`planModeApiProvider`)
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Mode::Plan => "planMode",
            Mode::Act => "actMode",
        }
    }

    /// Mode selected by a `use_plan_mode` flag
    #[must_use]
    pub fn from_plan_flag(use_plan_mode: bool) -> Self {
        if use_plan_mode {
            Mode::Plan
        } else {
            Mode::Act
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Plan => write!(f, "plan"),
            Mode::Act => write!(f, "act"),
        }
    }
}

/// Profile metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    /// Unique, time-sortable identifier
    pub id: Uuid,
    /// Profile name (unique across profiles)
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this is the default profile
    #[serde(default)]
    pub is_default: bool,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
    /// UI color tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// UI icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A named configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub metadata: ProfileMetadata,
    #[serde(default)]
    pub configuration: ProfileConfiguration,
}

impl Profile {
    /// Create a profile with a fresh id and empty configuration
    #[must_use]
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            metadata: ProfileMetadata {
                id: Uuid::now_v7(),
                name,
                description,
                is_default: false,
                created_at: now,
                updated_at: now,
                color: None,
                icon: None,
            },
            configuration: ProfileConfiguration::default(),
        }
    }

    /// Shorthand for `metadata.id`
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.metadata.id
    }

    /// Shorthand for `metadata.name`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Delta configuration: absent slices inherit defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_mode: Option<ModeConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_mode: Option<ModeConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<CommonConfiguration>,
}

impl ProfileConfiguration {
    /// Slice for the given mode
    #[must_use]
    pub fn mode(&self, mode: Mode) -> Option<&ModeConfiguration> {
        match mode {
            Mode::Plan => self.plan_mode.as_ref(),
            Mode::Act => self.act_mode.as_ref(),
        }
    }

    /// Whether no slice is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plan_mode.is_none() && self.act_mode.is_none() && self.common.is_none()
    }
}

/// User-defined OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiCompatibleCustomModel {
    /// Identifier; the API key lives under `openAiCompatible.<id>` in secrets
    pub id: String,
    /// Display name
    pub name: String,
    pub base_url: String,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Per-mode provider and model selection
///
/// A field whose JSON type does not match is kept in `extra` instead of
/// failing the whole slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct ModeConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_router_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_router_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_compatible_models: Option<Vec<OpenAiCompatibleCustomModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_studio_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lite_llm_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lite_llm_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesty_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesty_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub together_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fireworks_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseten_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseten_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugging_face_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugging_face_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huawei_cloud_maas_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huawei_cloud_maas_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oca_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oca_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aihubmix_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aihubmix_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hicap_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hicap_model_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nous_research_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vs_code_lm_model_selector: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_custom_selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_custom_model_base_id: Option<String>,

    /// Keys this version does not model; kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModeConfiguration {
    /// Mode slice selecting a provider and model
    pub fn with_provider(provider: impl Into<String>, model_id: Option<String>) -> Self {
        Self {
            api_provider: Some(provider.into()),
            api_model_id: model_id,
            ..Self::default()
        }
    }
}

/// Provider-agnostic settings shared by both modes
///
/// Mistyped fields are kept in `extra`, as for [`ModeConfiguration`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct CommonConfiguration {
    // Base URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesty_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lite_llm_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_studio_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asksage_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dify_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oca_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aihubmix_base_url: Option<String>,

    // AWS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_use_cross_region_inference: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_use_global_inference: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_use_prompt_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_authentication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_use_profile: Option<bool>,

    // Google Vertex / Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_api_version: Option<String>,

    // Provider tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_router_provider_sorting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_api_options_ctx_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_studio_max_tokens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lite_llm_use_prompt_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fireworks_model_max_completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fireworks_model_max_tokens: Option<u64>,

    // Regional API lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qwen_api_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moonshot_api_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zai_api_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimax_api_line: Option<String>,

    // SAP AI Core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_resource_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_ai_core_use_orchestration_mode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oca_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aihubmix_app_code: Option<String>,

    /// Keys this version does not model; kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Serialize for ModeConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ModeConfiguration::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ModeConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_slice(
            deserializer,
            |value| ModeConfiguration::deserialize(value),
            |slice| &mut slice.extra,
        )
    }
}

impl Serialize for CommonConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CommonConfiguration::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for CommonConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_slice(
            deserializer,
            |value| CommonConfiguration::deserialize(value),
            |slice| &mut slice.extra,
        )
    }
}

/// Parse a configuration slice, moving mistyped fields into its extra map
fn deserialize_slice<'de, D, T>(
    deserializer: D,
    strict: fn(Value) -> Result<T, serde_json::Error>,
    extra: fn(&mut T) -> &mut Map<String, Value>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    if let Ok(slice) = strict(Value::Object(map.clone())) {
        return Ok(slice);
    }

    // Fields are independent, so each one can be checked on its own
    let mut typed = Map::new();
    let mut mistyped = Map::new();
    for (key, value) in map {
        let single = Value::Object(std::iter::once((key.clone(), value.clone())).collect());
        if strict(single).is_ok() {
            typed.insert(key, value);
        } else {
            tracing::debug!(field = %key, "keeping mistyped configuration field verbatim");
            mistyped.insert(key, value);
        }
    }

    let mut slice = strict(Value::Object(typed)).map_err(de::Error::custom)?;
    extra(&mut slice).extend(mistyped);
    Ok(slice)
}

/// Per-profile secrets (API keys, cloud credentials)
///
/// Never written to the general state region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSecrets(BTreeMap<String, String>);

/// Key prefix for per-custom-model API keys
pub const OPENAI_COMPATIBLE_SECRET_PREFIX: &str = "openAiCompatible.";

impl ProfileSecrets {
    /// Empty secret set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a secret
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a secret, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Overlay `other` on top of these secrets
    pub fn merge(&mut self, other: ProfileSecrets) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Key names only, for display without values
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProfileSecrets {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Persisted envelope holding every profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSystemState {
    /// Schema version
    pub version: u32,
    /// Currently active profile
    #[serde(default)]
    pub active_profile_id: Option<Uuid>,
    /// All profiles in insertion order
    #[serde(default)]
    pub profiles: Vec<Profile>,
    /// Whether the legacy configuration has been migrated
    #[serde(default)]
    pub migration_completed: bool,
}

impl ProfileSystemState {
    /// Fresh envelope whose active profile is `active`
    #[must_use]
    pub fn new(active: Uuid) -> Self {
        Self {
            version: STATE_VERSION,
            active_profile_id: Some(active),
            profiles: Vec::new(),
            migration_completed: false,
        }
    }

    /// Find a profile by id
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.metadata.id == id)
    }
}

/// Partial update applied by `ProfileManager::update_profile`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub metadata: MetadataUpdate,
    pub configuration: Option<ConfigurationUpdate>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the profile
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    /// Set or clear the description
    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.metadata.description = Some(description);
        self
    }

    /// Set or clear the color tag
    #[must_use]
    pub fn color(mut self, color: Option<String>) -> Self {
        self.metadata.color = Some(color);
        self
    }

    /// Set or clear the icon
    #[must_use]
    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.metadata.icon = Some(icon);
        self
    }

    /// Replace the `common` slice
    #[must_use]
    pub fn common(mut self, common: CommonConfiguration) -> Self {
        self.configuration.get_or_insert_with(Default::default).common = Some(common);
        self
    }

    /// Replace the slice for `mode`
    #[must_use]
    pub fn mode(mut self, mode: Mode, config: ModeConfiguration) -> Self {
        let update = self.configuration.get_or_insert_with(Default::default);
        match mode {
            Mode::Plan => update.plan_mode = Some(config),
            Mode::Act => update.act_mode = Some(config),
        }
        self
    }

    /// Replace every slice that is present in `configuration`
    #[must_use]
    pub fn configuration(mut self, configuration: ProfileConfiguration) -> Self {
        self.configuration = Some(configuration.into());
        self
    }
}

/// Metadata fields to replace; `None` leaves a field untouched
///
/// The id, timestamps and default flag are not editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
}

/// Configuration slices to replace wholesale; `None` keeps the current slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationUpdate {
    pub common: Option<CommonConfiguration>,
    pub plan_mode: Option<ModeConfiguration>,
    pub act_mode: Option<ModeConfiguration>,
}

impl ConfigurationUpdate {
    /// Apply one-level merge onto `current`
    #[must_use]
    pub fn apply(self, current: &ProfileConfiguration) -> ProfileConfiguration {
        ProfileConfiguration {
            plan_mode: self.plan_mode.or_else(|| current.plan_mode.clone()),
            act_mode: self.act_mode.or_else(|| current.act_mode.clone()),
            common: self.common.or_else(|| current.common.clone()),
        }
    }
}

impl From<ProfileConfiguration> for ConfigurationUpdate {
    fn from(config: ProfileConfiguration) -> Self {
        Self {
            common: config.common,
            plan_mode: config.plan_mode,
            act_mode: config.act_mode,
        }
    }
}
