//! Loadout Core - Provider profiles, state stores, and configuration resolution
//!
//! This crate provides the profile manager, the conversion from profile
//! configuration to provider configuration, and the SQLite/keyring backed
//! state stores it persists to.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod convert;
pub mod error;
pub mod profile;
pub mod service;
pub mod storage;

pub use config::Settings;
pub use error::{ProfileError, ProfileResult};
pub use profile::{Profile, ProfileManager};
pub use service::ProfileService;
pub use storage::StateStore;
