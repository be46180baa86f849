//! CLI command handlers
//!
//! One module per top-level subcommand.

pub mod profile;
pub mod secrets;

use anyhow::anyhow;
use loadout_core::{Profile, ProfileManager};
use uuid::Uuid;

/// Look up a profile by name or UUID
pub fn find_profile(manager: &mut ProfileManager<'_>, identifier: &str) -> anyhow::Result<Profile> {
    let found = if let Ok(id) = Uuid::parse_str(identifier) {
        manager.get_profile(id)?
    } else {
        manager
            .get_all_profiles()?
            .into_iter()
            .find(|p| p.name() == identifier)
    };
    found.ok_or_else(|| anyhow!("Profile not found: {identifier}"))
}
