//! Loadout CLI - Command-line interface for provider profiles
//!
//! Provides `loadout profile` and `loadout secrets`.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loadout_core::config::{SecretBackend, Settings, LOG_ENV};
use loadout_core::storage::{KeyringStateStore, SqliteStateStore};
use loadout_core::StateStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::profile::ProfileCommands;
use commands::secrets::SecretsCommands;

#[derive(Parser)]
#[command(name = "loadout")]
#[command(about = "Loadout - provider profile manager")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Manage profile secrets
    Secrets {
        #[command(subcommand)]
        action: SecretsCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_tracing(&settings.log_level);

    let store = open_store(&settings)?;

    match cli.command {
        Commands::Profile { action } => commands::profile::execute(action, store.as_ref()),
        Commands::Secrets { action } => commands::secrets::execute(action, store.as_ref()),
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn open_store(settings: &Settings) -> anyhow::Result<Box<dyn StateStore>> {
    std::fs::create_dir_all(&settings.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            settings.data_dir.display()
        )
    })?;

    let db_path = settings.database_path();
    let db = SqliteStateStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), backend = ?settings.secret_backend, "opened state store");

    Ok(match settings.secret_backend {
        SecretBackend::Sqlite => Box::new(db),
        SecretBackend::Keyring => Box::new(KeyringStateStore::new(db)),
    })
}
