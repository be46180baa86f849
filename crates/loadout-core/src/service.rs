//! Request/response surface over the profile manager
//!
//! Each operation takes a typed request and returns a typed response or a
//! [`ServiceError`] carrying the machine-readable code. Successful mutations
//! flush the store and then push `profiles.reloaded`.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ProfileError;
use crate::profile::{Profile, ProfileConfiguration, ProfileManager, ProfileUpdate};

/// Error crossing the service boundary
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    /// `PROFILE_*` code
    pub code: String,
    pub message: String,
}

impl From<ProfileError> for ServiceError {
    fn from(err: ProfileError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Missing -> `None`, `null` -> `Some(None)`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProfileRequest {
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAllProfilesRequest {}

/// Fields left out are not changed; `null` clears an optional field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub profile_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: Option<Option<String>>,
    /// Slices present here replace the stored slices
    #[serde(default)]
    pub configuration: Option<ProfileConfiguration>,
}

impl UpdateProfileRequest {
    fn into_update(self) -> ProfileUpdate {
        let mut update = ProfileUpdate::new();
        update.metadata.name = self.name;
        update.metadata.description = self.description;
        update.metadata.color = self.color;
        update.metadata.icon = self.icon;
        update.configuration = self.configuration.map(Into::into);
        update
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProfileRequest {
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateProfileRequest {
    pub source_profile_id: Uuid,
    pub new_name: String,
    #[serde(default)]
    pub new_description: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateProfileRequest {
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProfileRequest {
    pub profile_id: Uuid,
    #[serde(default)]
    pub include_secrets: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProfileRequest {
    pub json: String,
    #[serde(default)]
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetProfileResponse {
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileListResponse {
    pub profiles: Vec<Profile>,
    pub active_profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProfileResponse {
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportProfileResponse {
    pub json: String,
}

/// Service owning a profile manager
#[derive(Debug)]
pub struct ProfileService<'a> {
    manager: ProfileManager<'a>,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub fn new(manager: ProfileManager<'a>) -> Self {
        Self { manager }
    }

    /// Direct access to the manager, e.g. to subscribe to events
    pub fn manager(&mut self) -> &mut ProfileManager<'a> {
        &mut self.manager
    }

    fn commit(&mut self) -> ServiceResult<()> {
        self.manager.flush()?;
        self.manager.emit_reloaded()?;
        Ok(())
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn create(&mut self, req: CreateProfileRequest) -> ServiceResult<ProfileResponse> {
        let profile = self
            .manager
            .create_profile(&req.name, req.description.as_deref())?;
        self.commit()?;
        Ok(ProfileResponse { profile })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn get(&mut self, req: GetProfileRequest) -> ServiceResult<GetProfileResponse> {
        let profile = self.manager.get_profile(req.profile_id)?;
        Ok(GetProfileResponse { profile })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn get_all(&mut self, _req: GetAllProfilesRequest) -> ServiceResult<ProfileListResponse> {
        let profiles = self.manager.get_all_profiles()?;
        let active_profile_id = self.manager.active_profile_id()?;
        Ok(ProfileListResponse {
            profiles,
            active_profile_id,
        })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn update(&mut self, req: UpdateProfileRequest) -> ServiceResult<ProfileResponse> {
        let id = req.profile_id;
        let profile = self.manager.update_profile(id, req.into_update())?;
        self.commit()?;
        Ok(ProfileResponse { profile })
    }

    /// Delete a profile and its secrets
    ///
    /// Once the profile is gone, a failure to remove its secrets is logged
    /// and the delete still succeeds.
    ///
    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn delete(&mut self, req: DeleteProfileRequest) -> ServiceResult<DeleteProfileResponse> {
        self.manager.delete_profile(req.profile_id)?;
        if let Err(e) = self.manager.delete_profile_secrets(req.profile_id) {
            tracing::warn!(
                profile_id = %req.profile_id,
                error = %e,
                "failed to remove secrets of deleted profile"
            );
        }
        self.commit()?;
        Ok(DeleteProfileResponse {
            profile_id: req.profile_id,
        })
    }

    /// Duplicate a profile, copying its secrets too
    ///
    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn duplicate(&mut self, req: DuplicateProfileRequest) -> ServiceResult<ProfileResponse> {
        let profile = self.manager.duplicate_profile(
            req.source_profile_id,
            &req.new_name,
            req.new_description.as_deref(),
        )?;
        let secrets = self.manager.profile_secrets(req.source_profile_id)?;
        if !secrets.is_empty() {
            self.manager.set_profile_secrets(profile.id(), &secrets)?;
        }
        self.commit()?;
        Ok(ProfileResponse { profile })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn activate(&mut self, req: ActivateProfileRequest) -> ServiceResult<ProfileResponse> {
        let profile = self.manager.activate_profile(req.profile_id)?;
        self.commit()?;
        Ok(ProfileResponse { profile })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn export(&mut self, req: ExportProfileRequest) -> ServiceResult<ExportProfileResponse> {
        let json = self
            .manager
            .export_profile(req.profile_id, req.include_secrets)?;
        Ok(ExportProfileResponse { json })
    }

    /// # Errors
    /// Returns the manager's error as a [`ServiceError`]
    pub fn import(&mut self, req: ImportProfileRequest) -> ServiceResult<ProfileResponse> {
        let profile = self
            .manager
            .import_profile(&req.json, req.new_name.as_deref())?;
        self.commit()?;
        Ok(ProfileResponse { profile })
    }
}
