//! Profile configuration -> provider configuration
//!
//! Two pure mappings: [`flatten_configuration`] builds the flat object read by
//! handlers, [`to_api_configuration`] builds the typed `{options, secrets}` pair.

pub mod api;
pub mod flat;

pub use api::{to_api_configuration, ApiConfiguration, ApiOptions, ApiProvider, ApiSecrets, ModeOptions};
pub use flat::{flatten_configuration, model_fields_for, prefixed_key, MODE_MODEL_FIELDS};
