//! Request/response service tests

use std::cell::RefCell;
use std::rc::Rc;

use loadout_core::profile::{ProfileEvent, ProfileEventKind, ProfileManager};
use loadout_core::service::{
    ActivateProfileRequest, CreateProfileRequest, DeleteProfileRequest, DuplicateProfileRequest,
    ExportProfileRequest, GetAllProfilesRequest, GetProfileRequest, ImportProfileRequest,
    UpdateProfileRequest,
};
use loadout_core::storage::{MemoryStateStore, StorageError};
use loadout_core::{ProfileService, StateStore};
use serde_json::{json, Value};

fn create(service: &mut ProfileService<'_>, name: &str) -> uuid::Uuid {
    service
        .create(CreateProfileRequest {
            name: name.to_string(),
            description: None,
        })
        .expect("Failed to create profile")
        .profile
        .id()
}

#[test]
fn test_create_flushes_and_pushes_reload() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    let pushed = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&pushed);
    service
        .manager()
        .subscribe(ProfileEventKind::Reloaded, move |event| {
            if let ProfileEvent::Reloaded { profiles } = event {
                log.borrow_mut().push(profiles.len());
            }
            Ok(())
        });

    create(&mut service, "First");
    create(&mut service, "Second");

    assert_eq!(store.flush_count(), 2);
    assert_eq!(*pushed.borrow(), [1, 2]);
}

#[test]
fn test_errors_cross_boundary_with_code() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    create(&mut service, "Taken");

    let err = service
        .create(CreateProfileRequest {
            name: "Taken".to_string(),
            description: None,
        })
        .unwrap_err();
    assert_eq!(err.code, "PROFILE_DUPLICATE_NAME");
    assert!(err.message.contains("Taken"));

    let wire = serde_json::to_value(&err).unwrap();
    assert_eq!(wire["code"], json!("PROFILE_DUPLICATE_NAME"));
    // A failed mutation is not flushed
    assert_eq!(store.flush_count(), 1);
}

#[test]
fn test_get_and_get_all() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    let first = create(&mut service, "One");
    create(&mut service, "Two");

    let got = service
        .get(GetProfileRequest { profile_id: first })
        .unwrap();
    assert_eq!(got.profile.map(|p| p.metadata.name), Some("One".to_string()));

    let all = service.get_all(GetAllProfilesRequest::default()).unwrap();
    assert_eq!(all.profiles.len(), 2);
    assert_eq!(all.active_profile_id, Some(first));
}

#[test]
fn test_update_request_from_json() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    let id = service
        .create(CreateProfileRequest {
            name: "Editable".to_string(),
            description: Some("before".to_string()),
        })
        .unwrap()
        .profile
        .id();

    let request: UpdateProfileRequest = serde_json::from_value(json!({
        "profileId": id,
        "description": null,
        "configuration": {
            "planMode": {"apiProvider": "groq", "groqModelId": "llama-3.3-70b"}
        }
    }))
    .unwrap();
    let updated = service.update(request).unwrap().profile;

    assert_eq!(updated.metadata.description, None);
    assert_eq!(updated.name(), "Editable");
    let plan = updated.configuration.plan_mode.expect("plan mode set");
    assert_eq!(plan.groq_model_id.as_deref(), Some("llama-3.3-70b"));
}

#[test]
fn test_delete_also_removes_secrets() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    create(&mut service, "Active");
    let doomed = create(&mut service, "Doomed");
    service
        .manager()
        .set_profile_secrets(doomed, &[("apiKey", "sk")].into_iter().collect())
        .unwrap();

    let response = service
        .delete(DeleteProfileRequest { profile_id: doomed })
        .unwrap();
    assert_eq!(response.profile_id, doomed);
    assert!(!store.has_secret_key(&loadout_core::profile::secrets_key(doomed)));
}

/// Memory store whose secret deletion always fails
#[derive(Default)]
struct StickySecretsStore {
    inner: MemoryStateStore,
}

impl StateStore for StickySecretsStore {
    fn get_global_state(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get_global_state(key)
    }

    fn set_global_state(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.inner.set_global_state(key, value)
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_secret(key)
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set_secret(key, value)
    }

    fn delete_secret(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Migration("secret region locked".to_string()))
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.inner.flush()
    }
}

#[test]
fn test_delete_succeeds_when_secret_cleanup_fails() {
    let store = StickySecretsStore::default();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    create(&mut service, "Active");
    let doomed = create(&mut service, "Doomed");
    let flushes = store.inner.flush_count();

    let response = service
        .delete(DeleteProfileRequest { profile_id: doomed })
        .expect("Failed to delete profile");
    assert_eq!(response.profile_id, doomed);

    let remaining = service
        .get_all(GetAllProfilesRequest::default())
        .expect("Failed to list profiles");
    assert_eq!(remaining.profiles.len(), 1);
    assert_eq!(store.inner.flush_count(), flushes + 1);
}

#[test]
fn test_delete_guard_surfaces_code() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    let only = create(&mut service, "Only");
    let err = service
        .delete(DeleteProfileRequest { profile_id: only })
        .unwrap_err();
    assert_eq!(err.code, "PROFILE_CANNOT_DELETE_LAST");
}

#[test]
fn test_duplicate_copies_secrets() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    let source = create(&mut service, "Source");
    service
        .manager()
        .set_profile_secrets(source, &[("geminiApiKey", "gm")].into_iter().collect())
        .unwrap();

    let copy = service
        .duplicate(DuplicateProfileRequest {
            source_profile_id: source,
            new_name: "Copy".to_string(),
            new_description: None,
        })
        .unwrap()
        .profile;

    assert_eq!(
        service.manager().profile_secret(copy.id(), "geminiApiKey").unwrap(),
        "gm"
    );
}

#[test]
fn test_activate_export_import() {
    let store = MemoryStateStore::new();
    let mut service = ProfileService::new(ProfileManager::new(&store));
    create(&mut service, "First");
    let second = create(&mut service, "Second");

    let activated = service
        .activate(ActivateProfileRequest { profile_id: second })
        .unwrap();
    assert_eq!(activated.profile.id(), second);

    let exported = service
        .export(ExportProfileRequest {
            profile_id: second,
            include_secrets: false,
        })
        .unwrap();
    let imported = service
        .import(ImportProfileRequest {
            json: exported.json,
            new_name: Some("Third".to_string()),
        })
        .unwrap()
        .profile;
    assert_eq!(imported.name(), "Third");
    assert_ne!(imported.id(), second);

    let err = service
        .import(ImportProfileRequest {
            json: "{}".to_string(),
            new_name: None,
        })
        .unwrap_err();
    assert_eq!(err.code, "PROFILE_IMPORT_INVALID");
}
