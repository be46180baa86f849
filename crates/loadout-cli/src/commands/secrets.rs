//! Secret CLI commands
//!
//! Handles: loadout secrets set/get/clear

use std::io::{self, BufRead};

use anyhow::bail;
use clap::Subcommand;
use loadout_core::profile::ProfileSecrets;
use loadout_core::{ProfileManager, StateStore};

use super::find_profile;

/// Secret commands
#[derive(Subcommand)]
pub enum SecretsCommands {
    /// Store a secret for a profile
    Set {
        /// Profile name or ID
        profile: String,
        /// Secret key (e.g. `apiKey`, `openRouterApiKey`)
        key: String,
        /// Secret value (read from stdin when omitted)
        value: Option<String>,
    },
    /// Show secret keys, or one secret value
    Get {
        /// Profile name or ID
        profile: String,
        /// Print the value of this key
        key: Option<String>,
    },
    /// Remove all secrets of a profile
    Clear {
        /// Profile name or ID
        profile: String,
    },
}

/// Execute a secrets command
///
/// # Errors
/// Returns an error if the command fails
pub fn execute(cmd: SecretsCommands, store: &dyn StateStore) -> anyhow::Result<()> {
    let mut manager = ProfileManager::new(store);

    match cmd {
        SecretsCommands::Set {
            profile,
            key,
            value,
        } => {
            let prof = find_profile(&mut manager, &profile)?;
            let value = match value {
                Some(v) => v,
                None => read_value()?,
            };
            if value.is_empty() {
                bail!("Secret value cannot be empty");
            }

            let mut update = ProfileSecrets::new();
            update.insert(key.clone(), value);
            manager.update_profile_secrets(prof.id(), update)?;
            manager.flush()?;
            println!("Stored {key} for profile '{}'", prof.name());
        }
        SecretsCommands::Get { profile, key } => {
            let prof = find_profile(&mut manager, &profile)?;
            match key {
                Some(key) => println!("{}", manager.profile_secret(prof.id(), &key)?),
                None => {
                    let secrets = manager.profile_secrets(prof.id())?;
                    if secrets.is_empty() {
                        println!("No secrets stored for '{}'.", prof.name());
                    } else {
                        for key in secrets.keys() {
                            println!("{key}");
                        }
                    }
                }
            }
        }
        SecretsCommands::Clear { profile } => {
            let prof = find_profile(&mut manager, &profile)?;
            manager.delete_profile_secrets(prof.id())?;
            manager.flush()?;
            println!("Cleared secrets for profile '{}'", prof.name());
        }
    }

    Ok(())
}

fn read_value() -> anyhow::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
