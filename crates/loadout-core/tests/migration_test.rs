//! Legacy configuration migration tests

use loadout_core::profile::{ProfileManager, ProfileSystemState, DEFAULT_PROFILE_NAME, STATE_KEY};
use loadout_core::storage::{MemoryStateStore, StateStore};
use loadout_core::ProfileError;
use serde_json::json;

fn legacy_config() -> serde_json::Value {
    json!({
        "apiKey": "sk-ant-legacy",
        "awsSecretKey": "aws-secret",
        "planModeApiProvider": "ollama",
        "planModeOllamaModelId": "llama3",
        "actModeApiProvider": "anthropic",
        "actModeApiModelId": "claude-sonnet",
        "awsRegion": "us-east-1",
        "requestTimeoutMs": 60000,
        "brandNewSetting": "kept",
        "openAiBaseUrl": null
    })
}

#[test]
fn test_migration_partitions_legacy_keys() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);

    let profile = manager
        .migrate_from_legacy_config(&legacy_config())
        .expect("Failed to migrate");

    assert_eq!(profile.name(), DEFAULT_PROFILE_NAME);
    assert_eq!(
        profile.metadata.description.as_deref(),
        Some("Migrated from previous configuration")
    );
    assert!(profile.metadata.is_default);

    let plan = profile.configuration.plan_mode.as_ref().expect("plan mode");
    assert_eq!(plan.api_provider.as_deref(), Some("ollama"));
    assert_eq!(plan.ollama_model_id.as_deref(), Some("llama3"));

    let act = profile.configuration.act_mode.as_ref().expect("act mode");
    assert_eq!(act.api_model_id.as_deref(), Some("claude-sonnet"));

    let common = profile.configuration.common.as_ref().expect("common");
    assert_eq!(common.aws_region.as_deref(), Some("us-east-1"));
    assert_eq!(common.request_timeout_ms, Some(60_000));
    assert_eq!(common.extra.get("brandNewSetting"), Some(&json!("kept")));
    assert_eq!(common.open_ai_base_url, None);

    let secrets = manager.profile_secrets(profile.id()).unwrap();
    assert_eq!(secrets.get("apiKey"), Some("sk-ant-legacy"));
    assert_eq!(secrets.get("awsSecretKey"), Some("aws-secret"));

    // Secrets never reach the general state region
    let raw = store.get_global_state(STATE_KEY).unwrap().unwrap();
    assert!(!raw.to_string().contains("sk-ant-legacy"));
}

#[test]
fn test_migration_marks_state() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let profile = manager.migrate_from_legacy_config(&legacy_config()).unwrap();

    let raw = store.get_global_state(STATE_KEY).unwrap().unwrap();
    let state: ProfileSystemState = serde_json::from_value(raw).unwrap();
    assert!(state.migration_completed);
    assert_eq!(state.active_profile_id, Some(profile.id()));
    assert_eq!(manager.default_profile().unwrap().map(|p| p.id()), Some(profile.id()));
}

#[test]
fn test_migration_is_idempotent_by_name() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);

    let first = manager.migrate_from_legacy_config(&legacy_config()).unwrap();
    let second = manager
        .migrate_from_legacy_config(&json!({"awsRegion": "ap-south-1"}))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(manager.get_all_profiles().unwrap().len(), 1);
}

#[test]
fn test_migration_with_only_secrets_has_empty_configuration() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let profile = manager
        .migrate_from_legacy_config(&json!({"openRouterApiKey": "sk-or"}))
        .unwrap();

    assert!(profile.configuration.is_empty());
    assert_eq!(
        manager.profile_secret(profile.id(), "openRouterApiKey").unwrap(),
        "sk-or"
    );
}

#[test]
fn test_migration_keeps_mistyped_field_across_reload() {
    let store = MemoryStateStore::new();
    let legacy = json!({
        "apiKey": "sk",
        "planModeApiProvider": "ollama",
        "planModeThinkingBudgetTokens": 1024.5,
        "awsRegion": "us-east-1"
    });

    let id = {
        let mut manager = ProfileManager::new(&store);
        manager
            .migrate_from_legacy_config(&legacy)
            .expect("Failed to migrate")
            .id()
    };

    let mut manager = ProfileManager::new(&store);
    let profile = manager
        .get_profile(id)
        .expect("Failed to read state")
        .expect("migrated profile");
    let plan = profile.configuration.plan_mode.expect("plan mode");
    assert_eq!(plan.api_provider.as_deref(), Some("ollama"));
    assert_eq!(plan.extra.get("thinkingBudgetTokens"), Some(&json!(1024.5)));

    // Later writes still see the existing profile
    manager.create_profile("Second", None).expect("Failed to create");
    assert_eq!(manager.get_all_profiles().unwrap().len(), 2);
}

#[test]
fn test_migration_rejects_non_object() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let err = manager
        .migrate_from_legacy_config(&json!(["not", "an", "object"]))
        .unwrap_err();
    assert!(matches!(err, ProfileError::MigrationFailed(_)));
    assert!(manager.get_all_profiles().unwrap().is_empty());
}

#[test]
fn test_migration_next_to_existing_profiles_moves_default_flag() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let existing = manager.create_profile("Existing", None).unwrap();
    manager.set_default_profile(existing.id()).unwrap();

    let migrated = manager.migrate_from_legacy_config(&legacy_config()).unwrap();

    let defaults: Vec<_> = manager
        .get_all_profiles()
        .unwrap()
        .into_iter()
        .filter(|p| p.metadata.is_default)
        .map(|p| p.id())
        .collect();
    assert_eq!(defaults, [migrated.id()]);
    // The existing active profile stays active
    assert_eq!(manager.active_profile_id().unwrap(), Some(existing.id()));
}

#[test]
fn test_cleanup_keeps_most_recent_default() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    manager.create_profile("Unrelated", None).unwrap();
    let first = manager.migrate_from_legacy_config(&legacy_config()).unwrap();

    // Simulate duplicates left behind by an older build
    let raw = store.get_global_state(STATE_KEY).unwrap().unwrap();
    let mut state: ProfileSystemState = serde_json::from_value(raw).unwrap();
    let mut newer = first.clone();
    newer.metadata.id = uuid::Uuid::now_v7();
    newer.metadata.is_default = false;
    newer.metadata.updated_at = first.metadata.updated_at + chrono::Duration::seconds(5);
    state.profiles.push(newer.clone());
    state.active_profile_id = Some(first.id());
    store
        .set_global_state(STATE_KEY, serde_json::to_value(&state).unwrap())
        .unwrap();

    let removed = manager.cleanup_duplicate_default_profiles().unwrap();
    assert_eq!(removed, 1);

    let profiles = manager.get_all_profiles().unwrap();
    let defaults: Vec<_> = profiles
        .iter()
        .filter(|p| p.name() == DEFAULT_PROFILE_NAME)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id(), newer.id());
    assert!(defaults[0].metadata.is_default);
    assert_eq!(manager.active_profile_id().unwrap(), Some(newer.id()));
    assert!(manager.get_profile(first.id()).unwrap().is_none());

    assert_eq!(manager.cleanup_duplicate_default_profiles().unwrap(), 0);
}
