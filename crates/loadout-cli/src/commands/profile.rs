//! Profile CLI commands
//!
//! Handles: loadout profile list/create/show/update/delete/duplicate/switch/
//! default/export/import/migrate/resolve

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use loadout_core::profile::ProfileConfiguration;
use loadout_core::service::{
    ActivateProfileRequest, CreateProfileRequest, DeleteProfileRequest, DuplicateProfileRequest,
    ExportProfileRequest, GetAllProfilesRequest, ImportProfileRequest, UpdateProfileRequest,
};
use loadout_core::{Profile, ProfileManager, ProfileService, StateStore};
use serde_json::Value;

use super::find_profile;

/// Profile commands
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an empty profile
    Create {
        /// Profile name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show profile details
    Show {
        /// Profile name or ID
        profile: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile metadata or configuration
    Update {
        /// Profile name or ID
        profile: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        /// Color tag
        #[arg(long)]
        color: Option<String>,
        /// Icon name
        #[arg(long)]
        icon: Option<String>,
        /// JSON file with `planMode`/`actMode`/`common`; present slices replace stored ones
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Delete a profile and its secrets
    Delete {
        /// Profile name or ID
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Copy a profile's configuration and secrets under a new name
    Duplicate {
        /// Profile name or ID
        profile: String,
        /// Name of the copy
        new_name: String,
        /// Description of the copy
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Make a profile the active one
    Switch {
        /// Profile name or ID
        profile: String,
    },
    /// Mark a profile as the default
    Default {
        /// Profile name or ID
        profile: String,
    },
    /// Export a profile as JSON
    Export {
        /// Profile name or ID
        profile: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include secrets in the export
        #[arg(long)]
        include_secrets: bool,
    },
    /// Import a profile from an export file
    Import {
        /// Export file
        file: PathBuf,
        /// Import under a different name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Create the Default profile from a legacy flat configuration file
    Migrate {
        /// Legacy JSON configuration
        file: PathBuf,
    },
    /// Print the resolved flat configuration of a profile
    Resolve {
        /// Profile name or ID (defaults to the active profile)
        profile: Option<String>,
        /// Resolve for plan mode instead of act mode
        #[arg(long)]
        plan: bool,
        /// Print secret values instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },
}

/// Execute a profile command
///
/// # Errors
/// Returns an error if the command fails
pub fn execute(cmd: ProfileCommands, store: &dyn StateStore) -> anyhow::Result<()> {
    let mut service = ProfileService::new(ProfileManager::new(store));

    match cmd {
        ProfileCommands::List { json } => execute_list(&mut service, json),
        ProfileCommands::Create { name, description } => {
            let profile = service
                .create(CreateProfileRequest { name, description })?
                .profile;
            println!("Created profile: {} ({})", profile.name(), profile.id());
            Ok(())
        }
        ProfileCommands::Show { profile, json } => {
            let prof = find_profile(service.manager(), &profile)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prof)?);
            } else {
                print_profile(&prof);
            }
            Ok(())
        }
        ProfileCommands::Update {
            profile,
            name,
            description,
            clear_description,
            color,
            icon,
            config,
        } => {
            let prof = find_profile(service.manager(), &profile)?;
            let configuration = config.map(|path| read_configuration(&path)).transpose()?;
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };

            let updated = service
                .update(UpdateProfileRequest {
                    profile_id: prof.id(),
                    name,
                    description,
                    color: color.map(Some),
                    icon: icon.map(Some),
                    configuration,
                })?
                .profile;
            println!("Updated profile: {}", updated.name());
            Ok(())
        }
        ProfileCommands::Delete { profile, force } => {
            let prof = find_profile(service.manager(), &profile)?;

            if !force {
                print!("Delete profile '{}' (ID: {})? [y/N] ", prof.name(), prof.id());
                io::stdout().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            service.delete(DeleteProfileRequest {
                profile_id: prof.id(),
            })?;
            println!("Deleted profile: {}", prof.name());
            Ok(())
        }
        ProfileCommands::Duplicate {
            profile,
            new_name,
            description,
        } => {
            let source = find_profile(service.manager(), &profile)?;
            let copy = service
                .duplicate(DuplicateProfileRequest {
                    source_profile_id: source.id(),
                    new_name,
                    new_description: description,
                })?
                .profile;
            println!("Created profile: {} ({})", copy.name(), copy.id());
            Ok(())
        }
        ProfileCommands::Switch { profile } => {
            let prof = find_profile(service.manager(), &profile)?;
            service.activate(ActivateProfileRequest {
                profile_id: prof.id(),
            })?;
            println!("Active profile: {}", prof.name());
            Ok(())
        }
        ProfileCommands::Default { profile } => {
            let manager = service.manager();
            let prof = find_profile(manager, &profile)?;
            manager.set_default_profile(prof.id())?;
            manager.flush()?;
            println!("Default profile: {}", prof.name());
            Ok(())
        }
        ProfileCommands::Export {
            profile,
            output,
            include_secrets,
        } => {
            let prof = find_profile(service.manager(), &profile)?;
            let json = service
                .export(ExportProfileRequest {
                    profile_id: prof.id(),
                    include_secrets,
                })?
                .json;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported profile '{}' to {}", prof.name(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        ProfileCommands::Import { file, name } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let profile = service
                .import(ImportProfileRequest {
                    json,
                    new_name: name,
                })?
                .profile;
            println!("Imported profile: {} ({})", profile.name(), profile.id());
            Ok(())
        }
        ProfileCommands::Migrate { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let legacy: Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let manager = service.manager();
            let profile = manager.migrate_from_legacy_config(&legacy)?;
            manager.flush()?;
            println!("Default profile: {} ({})", profile.name(), profile.id());
            Ok(())
        }
        ProfileCommands::Resolve {
            profile,
            plan,
            show_secrets,
        } => {
            let manager = service.manager();
            let prof = match profile {
                Some(identifier) => find_profile(manager, &identifier)?,
                None => manager
                    .active_profile()?
                    .context("No active profile")?,
            };

            let mut flat = manager.convert_to_api_configuration(prof.id(), plan)?;
            if !show_secrets {
                let secrets = manager.profile_secrets(prof.id())?;
                for key in secrets.keys() {
                    if let Some(value) = flat.get_mut(key) {
                        *value = Value::String("********".to_string());
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&flat)?);
            Ok(())
        }
    }
}

fn execute_list(service: &mut ProfileService<'_>, json: bool) -> anyhow::Result<()> {
    let list = service.get_all(GetAllProfilesRequest::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.profiles.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    println!("Profiles:");
    for p in &list.profiles {
        let marker = if Some(p.id()) == list.active_profile_id {
            "*"
        } else {
            " "
        };
        let default = if p.metadata.is_default { " [default]" } else { "" };
        let desc = p.metadata.description.as_deref().unwrap_or("No description");
        println!("{marker} {} - {}{default} ({desc})", p.id(), p.name());
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    let meta = &profile.metadata;
    println!("Profile: {}", meta.name);
    println!("ID: {}", meta.id);
    if let Some(desc) = &meta.description {
        println!("Description: {desc}");
    }
    println!("Default: {}", meta.is_default);
    println!("Created: {}", meta.created_at);
    println!("Updated: {}", meta.updated_at);

    let config = &profile.configuration;
    for (label, mode) in [("Plan mode", &config.plan_mode), ("Act mode", &config.act_mode)] {
        match mode {
            Some(m) => println!(
                "{label}: {} / {}",
                m.api_provider.as_deref().unwrap_or("-"),
                m.api_model_id.as_deref().unwrap_or("-")
            ),
            None => println!("{label}: inherited"),
        }
    }
    println!("Common settings: {}", config.common.is_some());
}

fn read_configuration(path: &Path) -> anyhow::Result<ProfileConfiguration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid profile configuration", path.display()))
}
