//! Profile export/import tests

use std::fs;

use loadout_core::profile::{
    CommonConfiguration, Mode, ModeConfiguration, ProfileExport, ProfileManager, ProfileUpdate,
    EXPORT_FORMAT_VERSION,
};
use loadout_core::storage::MemoryStateStore;
use loadout_core::ProfileError;
use tempfile::TempDir;

fn configured_profile(manager: &mut ProfileManager<'_>) -> loadout_core::Profile {
    let profile = manager
        .create_profile("Exported", Some("for the laptop"))
        .expect("Failed to create profile");
    let mut plan = ModeConfiguration::with_provider("ollama", Some("qwen2.5-coder".to_string()));
    plan.ollama_model_id = Some("qwen2.5-coder".to_string());
    manager
        .update_profile(
            profile.id(),
            ProfileUpdate::new()
                .mode(Mode::Plan, plan)
                .common(CommonConfiguration {
                    ollama_base_url: Some("http://10.0.0.2:11434".to_string()),
                    ..CommonConfiguration::default()
                })
                .color(Some("teal".to_string())),
        )
        .expect("Failed to update profile")
}

#[test]
fn test_export_import_round_trip_assigns_new_identity() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let original = configured_profile(&mut manager);

    let json = manager.export_profile(original.id(), false).unwrap();
    let imported = manager
        .import_profile(&json, Some("Imported"))
        .expect("Failed to import profile");

    assert_ne!(imported.id(), original.id());
    assert_eq!(imported.name(), "Imported");
    assert_eq!(imported.configuration, original.configuration);
    assert_eq!(imported.metadata.description, original.metadata.description);
    assert_eq!(imported.metadata.color.as_deref(), Some("teal"));
    assert!(!imported.metadata.is_default);
    assert_eq!(manager.get_all_profiles().unwrap().len(), 2);
}

#[test]
fn test_import_without_rename_collides() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let original = configured_profile(&mut manager);
    let json = manager.export_profile(original.id(), false).unwrap();

    assert!(matches!(
        manager.import_profile(&json, None),
        Err(ProfileError::DuplicateName(_))
    ));
}

#[test]
fn test_import_into_another_store_keeps_name() {
    let source_store = MemoryStateStore::new();
    let mut source = ProfileManager::new(&source_store);
    let original = configured_profile(&mut source);
    let json = source.export_profile(original.id(), false).unwrap();

    let target_store = MemoryStateStore::new();
    let mut target = ProfileManager::new(&target_store);
    let imported = target.import_profile(&json, None).unwrap();
    assert_eq!(imported.name(), "Exported");
    assert_eq!(target.active_profile_id().unwrap(), Some(imported.id()));
}

#[test]
fn test_secrets_exported_only_on_request() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let original = configured_profile(&mut manager);
    manager
        .set_profile_secrets(original.id(), &[("ollamaApiKey", "ol-key")].into_iter().collect())
        .unwrap();

    let without = manager.export_profile(original.id(), false).unwrap();
    assert!(!without.contains("ol-key"));

    let with = manager.export_profile(original.id(), true).unwrap();
    let parsed = ProfileExport::parse(&with).unwrap();
    assert_eq!(parsed.version, EXPORT_FORMAT_VERSION);
    assert_eq!(
        parsed.secrets.as_ref().and_then(|s| s.get("ollamaApiKey")),
        Some("ol-key")
    );

    let imported = manager.import_profile(&with, Some("With Secrets")).unwrap();
    assert_eq!(
        manager.profile_secret(imported.id(), "ollamaApiKey").unwrap(),
        "ol-key"
    );
}

#[test]
fn test_export_file_round_trip() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("exported.json");

    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    let original = configured_profile(&mut manager);
    fs::write(&path, manager.export_profile(original.id(), false).unwrap())
        .expect("Failed to write export");

    let text = fs::read_to_string(&path).expect("Failed to read export");
    let imported = manager.import_profile(&text, Some("From File")).unwrap();
    assert_eq!(imported.configuration, original.configuration);
}

#[test]
fn test_import_rejects_malformed_documents() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);

    for bad in [
        "",
        "{",
        "42",
        r#"{"version": 1, "exportedAt": "2024-05-01T00:00:00Z"}"#,
        r#"{"version": 1, "profile": {}}"#,
        r#"{"version": 1, "exportedAt": "2024-05-01T00:00:00Z", "profile": {"name": "x"}}"#,
    ] {
        let err = manager.import_profile(bad, Some("Whatever")).unwrap_err();
        assert_eq!(err.code(), "PROFILE_IMPORT_INVALID", "input: {bad}");
    }
    assert!(manager.get_all_profiles().unwrap().is_empty());
}

#[test]
fn test_export_unknown_profile() {
    let store = MemoryStateStore::new();
    let mut manager = ProfileManager::new(&store);
    assert!(matches!(
        manager.export_profile(uuid::Uuid::now_v7(), true),
        Err(ProfileError::NotFound(_))
    ));
}
