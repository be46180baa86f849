//! Profile manager: CRUD over the persisted envelope
//!
//! Every mutation reads the whole [`ProfileSystemState`], validates, then
//! writes it back in one `set_global_state` call, so a failed check never
//! leaves a partial write. The in-memory cache mirrors the envelope.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::events::{EventBus, ListenerError, ProfileEvent, ProfileEventKind, SubscriptionId};
use super::export::ProfileExport;
use super::migration::{migrate_legacy_config, DEFAULT_PROFILE_NAME, MIGRATED_DESCRIPTION};
use super::validate::{validate_description, validate_name};
use super::{Mode, Profile, ProfileSecrets, ProfileSystemState, ProfileUpdate};
use crate::convert::{flatten_configuration, to_api_configuration, ApiConfiguration};
use crate::error::{ProfileError, ProfileResult};
use crate::storage::{StateStore, StorageError};

/// General-state key holding the envelope
pub const STATE_KEY: &str = "profileSystemState";

/// Secret-region key holding a profile's secrets
#[must_use]
pub fn secrets_key(profile_id: Uuid) -> String {
    format!("loadout.profile.{profile_id}.secrets")
}

/// Owner of the profile cache, bound to one store for its lifetime
pub struct ProfileManager<'a> {
    store: &'a dyn StateStore,
    cache: HashMap<Uuid, Profile>,
    events: EventBus,
}

impl<'a> ProfileManager<'a> {
    /// Create a manager and load the persisted profiles
    ///
    /// A missing or unreadable envelope leaves the cache empty.
    pub fn new(store: &'a dyn StateStore) -> Self {
        let mut manager = Self {
            store,
            cache: HashMap::new(),
            events: EventBus::new(),
        };

        match manager.load_state() {
            Ok(Some(state)) => manager.reload_cache(&state),
            Ok(None) => tracing::debug!("no profile state persisted yet"),
            Err(e) => tracing::warn!(error = %e, "failed to load profiles, starting empty"),
        }

        manager
    }

    fn load_state(&self) -> ProfileResult<Option<ProfileSystemState>> {
        let Some(value) = self.store.get_global_state(STATE_KEY)? else {
            return Ok(None);
        };

        let state = serde_json::from_value(value).map_err(StorageError::from)?;
        Ok(Some(state))
    }

    fn save_state(&self, state: &ProfileSystemState) -> ProfileResult<()> {
        let value = serde_json::to_value(state).map_err(StorageError::from)?;
        self.store.set_global_state(STATE_KEY, value)?;
        Ok(())
    }

    fn reload_cache(&mut self, state: &ProfileSystemState) {
        self.cache = state
            .profiles
            .iter()
            .map(|p| (p.id(), p.clone()))
            .collect();
    }

    fn ensure_unique_name(
        state: Option<&ProfileSystemState>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ProfileResult<()> {
        let taken = state.is_some_and(|s| {
            s.profiles
                .iter()
                .any(|p| p.metadata.name == name && Some(p.id()) != exclude)
        });
        if taken {
            return Err(ProfileError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn emit(&self, event: &ProfileEvent) {
        self.events.emit(event);
    }

    /// Create an empty profile
    ///
    /// The first profile ever created becomes the active one.
    ///
    /// # Errors
    /// Returns `InvalidName`, `DuplicateName` or `InvalidConfiguration` when
    /// validation fails, or a storage error
    pub fn create_profile(&mut self, name: &str, description: Option<&str>) -> ProfileResult<Profile> {
        validate_name(name)?;
        validate_description(description)?;

        let state = self.load_state()?;
        Self::ensure_unique_name(state.as_ref(), name, None)?;

        let profile = Profile::new(name.to_string(), description.map(str::to_string));
        let mut state = state.unwrap_or_else(|| ProfileSystemState::new(profile.id()));
        if state.active_profile_id.is_none() {
            state.active_profile_id = Some(profile.id());
        }
        state.profiles.push(profile.clone());
        self.save_state(&state)?;

        self.cache.insert(profile.id(), profile.clone());
        tracing::debug!(profile_id = %profile.id(), name = %profile.name(), "created profile");
        self.emit(&ProfileEvent::Created {
            profile: profile.clone(),
        });

        Ok(profile)
    }

    /// Look up a profile; `None` when absent
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn get_profile(&mut self, id: Uuid) -> ProfileResult<Option<Profile>> {
        if let Some(profile) = self.cache.get(&id) {
            return Ok(Some(profile.clone()));
        }

        let found = self
            .load_state()?
            .and_then(|state| state.find(id).cloned());
        if let Some(profile) = &found {
            self.cache.insert(id, profile.clone());
        }
        Ok(found)
    }

    /// All profiles in insertion order; resynchronizes the cache
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn get_all_profiles(&mut self) -> ProfileResult<Vec<Profile>> {
        match self.load_state()? {
            Some(state) => {
                self.reload_cache(&state);
                Ok(state.profiles)
            }
            None => {
                self.cache.clear();
                Ok(Vec::new())
            }
        }
    }

    /// Apply a partial update
    ///
    /// `updatedAt` is always refreshed. Each configuration slice present in
    /// the update replaces the stored slice wholesale.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, a validation error for a bad
    /// name or description, or a storage error
    pub fn update_profile(&mut self, id: Uuid, update: ProfileUpdate) -> ProfileResult<Profile> {
        let mut state = self
            .load_state()?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let index = state
            .profiles
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;

        let metadata = update.metadata;
        if let Some(name) = &metadata.name {
            if *name != state.profiles[index].metadata.name {
                validate_name(name)?;
                Self::ensure_unique_name(Some(&state), name, Some(id))?;
            }
        }
        if let Some(description) = &metadata.description {
            validate_description(description.as_deref())?;
        }

        let profile = &mut state.profiles[index];
        if let Some(name) = metadata.name {
            profile.metadata.name = name;
        }
        if let Some(description) = metadata.description {
            profile.metadata.description = description;
        }
        if let Some(color) = metadata.color {
            profile.metadata.color = color;
        }
        if let Some(icon) = metadata.icon {
            profile.metadata.icon = icon;
        }
        if let Some(configuration) = update.configuration {
            profile.configuration = configuration.apply(&profile.configuration);
        }
        profile.metadata.updated_at = Utc::now();

        let updated = profile.clone();
        self.save_state(&state)?;

        self.cache.insert(id, updated.clone());
        tracing::debug!(profile_id = %id, "updated profile");
        self.emit(&ProfileEvent::Updated {
            profile: updated.clone(),
        });

        Ok(updated)
    }

    /// Delete a profile; its secrets are left in place
    ///
    /// # Errors
    /// Returns `NotFound`, `CannotDeleteLast`, `CannotDeleteActive` or
    /// `CannotDeleteDefault` (checked in that order), or a storage error
    pub fn delete_profile(&mut self, id: Uuid) -> ProfileResult<()> {
        let mut state = self
            .load_state()?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let profile = state
            .find(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;

        if state.profiles.len() <= 1 {
            return Err(ProfileError::CannotDeleteLast);
        }
        if state.active_profile_id == Some(id) {
            return Err(ProfileError::CannotDeleteActive);
        }
        if profile.metadata.is_default {
            return Err(ProfileError::CannotDeleteDefault);
        }

        state.profiles.retain(|p| p.id() != id);
        self.save_state(&state)?;

        self.cache.remove(&id);
        tracing::debug!(profile_id = %id, "deleted profile");
        self.emit(&ProfileEvent::Deleted { profile_id: id });

        Ok(())
    }

    /// Copy a profile's configuration into a new profile
    ///
    /// The description defaults to `Copy of <source name>`. Secrets are not
    /// copied.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown source, any error of
    /// [`Self::create_profile`], or a storage error
    pub fn duplicate_profile(
        &mut self,
        source_id: Uuid,
        new_name: &str,
        new_description: Option<&str>,
    ) -> ProfileResult<Profile> {
        let source = self
            .get_profile(source_id)?
            .ok_or_else(|| ProfileError::NotFound(source_id.to_string()))?;

        let description = match new_description {
            Some(d) => d.to_string(),
            None => format!("Copy of {}", source.name()),
        };
        let created = self.create_profile(new_name, Some(&description))?;

        self.update_profile(
            created.id(),
            ProfileUpdate::new().configuration(source.configuration),
        )
    }

    /// Make a profile the active one
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, `SystemNotInitialized` if no
    /// envelope exists, or a storage error
    pub fn switch_profile(&mut self, id: Uuid) -> ProfileResult<Profile> {
        let profile = self
            .get_profile(id)?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let mut state = self.load_state()?.ok_or(ProfileError::SystemNotInitialized)?;

        let previous_profile_id = state.active_profile_id.replace(id);
        self.save_state(&state)?;

        tracing::debug!(profile_id = %id, previous = ?previous_profile_id, "switched profile");
        self.emit(&ProfileEvent::Switched {
            profile: profile.clone(),
            previous_profile_id,
        });

        Ok(profile)
    }

    /// Alias of [`Self::switch_profile`]
    ///
    /// # Errors
    /// See [`Self::switch_profile`]
    pub fn activate_profile(&mut self, id: Uuid) -> ProfileResult<Profile> {
        self.switch_profile(id)
    }

    /// Id of the active profile
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn active_profile_id(&self) -> ProfileResult<Option<Uuid>> {
        Ok(self.load_state()?.and_then(|s| s.active_profile_id))
    }

    /// The active profile, if any
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn active_profile(&mut self) -> ProfileResult<Option<Profile>> {
        match self.active_profile_id()? {
            Some(id) => self.get_profile(id),
            None => Ok(None),
        }
    }

    /// The profile flagged as default, if any
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn default_profile(&mut self) -> ProfileResult<Option<Profile>> {
        Ok(self
            .get_all_profiles()?
            .into_iter()
            .find(|p| p.metadata.is_default))
    }

    /// Flag exactly one profile as default
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error
    pub fn set_default_profile(&mut self, id: Uuid) -> ProfileResult<Profile> {
        let mut state = self
            .load_state()?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        if state.find(id).is_none() {
            return Err(ProfileError::NotFound(id.to_string()));
        }

        for profile in &mut state.profiles {
            profile.metadata.is_default = profile.id() == id;
        }
        self.save_state(&state)?;
        self.reload_cache(&state);

        tracing::debug!(profile_id = %id, "set default profile");
        state
            .find(id)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    /// Secrets stored for a profile
    ///
    /// An absent, cleared or unparsable entry yields an empty set.
    ///
    /// # Errors
    /// Returns a storage error if the secret region cannot be read
    pub fn profile_secrets(&self, id: Uuid) -> ProfileResult<ProfileSecrets> {
        let Some(raw) = self.store.get_secret(&secrets_key(id))? else {
            return Ok(ProfileSecrets::new());
        };
        if raw.is_empty() {
            return Ok(ProfileSecrets::new());
        }

        match serde_json::from_str(&raw) {
            Ok(secrets) => Ok(secrets),
            Err(e) => {
                tracing::warn!(profile_id = %id, error = %e, "failed to parse profile secrets");
                Ok(ProfileSecrets::new())
            }
        }
    }

    /// Replace a profile's secrets
    ///
    /// # Errors
    /// Returns a storage error if the secret region cannot be written
    pub fn set_profile_secrets(&self, id: Uuid, secrets: &ProfileSecrets) -> ProfileResult<()> {
        let raw = serde_json::to_string(secrets).map_err(StorageError::from)?;
        self.store.set_secret(&secrets_key(id), &raw)?;
        tracing::debug!(profile_id = %id, count = secrets.len(), "stored profile secrets");
        Ok(())
    }

    /// Merge `updates` over the stored secrets, returning the result
    ///
    /// # Errors
    /// Returns a storage error if the secret region cannot be accessed
    pub fn update_profile_secrets(
        &self,
        id: Uuid,
        updates: ProfileSecrets,
    ) -> ProfileResult<ProfileSecrets> {
        let mut secrets = self.profile_secrets(id)?;
        secrets.merge(updates);
        self.set_profile_secrets(id, &secrets)?;
        Ok(secrets)
    }

    /// Remove a profile's secrets
    ///
    /// # Errors
    /// Returns a storage error if the secret region cannot be written
    pub fn delete_profile_secrets(&self, id: Uuid) -> ProfileResult<()> {
        self.store.delete_secret(&secrets_key(id))?;
        tracing::debug!(profile_id = %id, "deleted profile secrets");
        Ok(())
    }

    /// One secret value
    ///
    /// # Errors
    /// Returns `SecretsNotFound` when the key is not set, or a storage error
    pub fn profile_secret(&self, id: Uuid, key: &str) -> ProfileResult<String> {
        self.profile_secrets(id)?
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| ProfileError::SecretsNotFound(format!("{id} ({key})")))
    }

    /// Turn a flat legacy configuration into the `Default` profile
    ///
    /// Returns the existing `Default` profile unchanged if there is one.
    ///
    /// # Errors
    /// Returns `MigrationFailed` for malformed input, or a storage error
    pub fn migrate_from_legacy_config(&mut self, legacy: &Value) -> ProfileResult<Profile> {
        let state = self.load_state()?;
        if let Some(existing) = state
            .as_ref()
            .and_then(|s| s.profiles.iter().find(|p| p.name() == DEFAULT_PROFILE_NAME))
        {
            tracing::info!(profile_id = %existing.id(), "default profile exists, skipping migration");
            return Ok(existing.clone());
        }

        let (configuration, secrets) = migrate_legacy_config(legacy)?;

        let mut profile = Profile::new(
            DEFAULT_PROFILE_NAME.to_string(),
            Some(MIGRATED_DESCRIPTION.to_string()),
        );
        profile.metadata.is_default = true;
        profile.configuration = configuration;

        if !secrets.is_empty() {
            self.set_profile_secrets(profile.id(), &secrets)?;
        }

        let mut state = state.unwrap_or_else(|| ProfileSystemState::new(profile.id()));
        if state.active_profile_id.is_none() {
            state.active_profile_id = Some(profile.id());
        }
        for existing in &mut state.profiles {
            existing.metadata.is_default = false;
        }
        state.profiles.push(profile.clone());
        state.migration_completed = true;
        self.save_state(&state)?;
        self.reload_cache(&state);

        tracing::info!(
            profile_id = %profile.id(),
            secrets = secrets.len(),
            "migrated legacy configuration"
        );
        self.emit(&ProfileEvent::Created {
            profile: profile.clone(),
        });

        Ok(profile)
    }

    /// Collapse several `Default` profiles into the most recently updated one
    ///
    /// Returns how many profiles were removed. The kept profile becomes the
    /// default, and the active id moves to it if it pointed at a removed one.
    ///
    /// # Errors
    /// Returns a storage error
    pub fn cleanup_duplicate_default_profiles(&mut self) -> ProfileResult<usize> {
        let Some(mut state) = self.load_state()? else {
            return Ok(0);
        };

        let mut defaults: Vec<&Profile> = state
            .profiles
            .iter()
            .filter(|p| p.name() == DEFAULT_PROFILE_NAME)
            .collect();
        if defaults.len() <= 1 {
            tracing::debug!("no duplicate default profiles");
            return Ok(0);
        }

        defaults.sort_by(|a, b| b.metadata.updated_at.cmp(&a.metadata.updated_at));
        let keep = defaults[0].id();
        let removed: Vec<Uuid> = defaults[1..].iter().map(|p| p.id()).collect();

        state.profiles.retain(|p| !removed.contains(&p.id()));
        for profile in &mut state.profiles {
            profile.metadata.is_default = profile.id() == keep;
        }
        if state
            .active_profile_id
            .is_some_and(|active| removed.contains(&active))
        {
            state.active_profile_id = Some(keep);
        }
        self.save_state(&state)?;
        self.reload_cache(&state);

        tracing::info!(kept = %keep, removed = removed.len(), "removed duplicate default profiles");
        Ok(removed.len())
    }

    /// Flat configuration of a profile for one mode
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error
    pub fn convert_to_api_configuration(
        &mut self,
        id: Uuid,
        use_plan_mode: bool,
    ) -> ProfileResult<Map<String, Value>> {
        let profile = self
            .get_profile(id)?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let secrets = self.profile_secrets(id)?;
        Ok(flatten_configuration(
            &profile.configuration,
            &secrets,
            Mode::from_plan_flag(use_plan_mode),
        ))
    }

    /// Flat configuration of the active profile; `None` without one
    ///
    /// # Errors
    /// Returns a storage error
    pub fn active_profile_as_api_configuration(
        &mut self,
        use_plan_mode: bool,
    ) -> ProfileResult<Option<Map<String, Value>>> {
        match self.active_profile()? {
            Some(profile) => self
                .convert_to_api_configuration(profile.id(), use_plan_mode)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Typed provider configuration of a profile
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error
    pub fn to_api_configuration(&mut self, id: Uuid) -> ProfileResult<ApiConfiguration> {
        let profile = self
            .get_profile(id)?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let secrets = self.profile_secrets(id)?;
        Ok(to_api_configuration(&profile.configuration, &secrets))
    }

    /// Serialize a profile to an export document
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error
    pub fn export_profile(&mut self, id: Uuid, include_secrets: bool) -> ProfileResult<String> {
        let profile = self
            .get_profile(id)?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let secrets = if include_secrets {
            Some(self.profile_secrets(id)?)
        } else {
            None
        };
        ProfileExport::new(profile, secrets).to_json()
    }

    /// Create a profile from an export document
    ///
    /// The imported profile always gets a new id and is never the default.
    /// `new_name` overrides the exported name.
    ///
    /// # Errors
    /// Returns `ImportInvalid` for a malformed document, any error of
    /// [`Self::create_profile`], or a storage error
    pub fn import_profile(&mut self, json: &str, new_name: Option<&str>) -> ProfileResult<Profile> {
        let export = ProfileExport::parse(json)?;
        let source = export.profile;
        let name = new_name.unwrap_or(&source.metadata.name);

        let created = self.create_profile(name, source.metadata.description.as_deref())?;
        let update = ProfileUpdate::new()
            .color(source.metadata.color)
            .icon(source.metadata.icon)
            .configuration(source.configuration);
        let imported = self.update_profile(created.id(), update)?;

        if let Some(secrets) = export.secrets.filter(|s| !s.is_empty()) {
            self.set_profile_secrets(imported.id(), &secrets)?;
        }

        tracing::debug!(profile_id = %imported.id(), source_id = %source.metadata.id, "imported profile");
        Ok(imported)
    }

    /// Register an event listener
    pub fn subscribe<F>(&mut self, kind: ProfileEventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ProfileEvent) -> Result<(), ListenerError> + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    /// Remove an event listener
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Push the full profile list to `profiles.reloaded` listeners
    ///
    /// # Errors
    /// Returns a storage error if the envelope cannot be read
    pub fn emit_reloaded(&mut self) -> ProfileResult<()> {
        let profiles = self.get_all_profiles()?;
        self.emit(&ProfileEvent::Reloaded { profiles });
        Ok(())
    }

    /// Flush the underlying store
    ///
    /// # Errors
    /// Returns a storage error if the store cannot be synced
    pub fn flush(&self) -> ProfileResult<()> {
        self.store.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for ProfileManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager")
            .field("cached", &self.cache.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
