//! Profile management
//!
//! Profiles are named configuration bundles (provider, model, settings)
//! whose secrets live separately in the store's secret region.

pub mod events;
pub mod export;
pub mod manager;
pub mod migration;
mod types;
pub mod validate;

pub use events::{EventBus, ListenerError, ProfileEvent, ProfileEventKind, SubscriptionId};
pub use export::{ProfileExport, EXPORT_FORMAT_VERSION};
pub use manager::{secrets_key, ProfileManager, STATE_KEY};
pub use migration::{migrate_legacy_config, DEFAULT_PROFILE_NAME};
pub use types::*;
pub use validate::{validate_description, validate_name};
