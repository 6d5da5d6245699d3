//! Configuration models and layered config loading.
//!
//! This crate owns the Atelier config schema, its defaults and validation,
//! and the user/cwd/runtime layer merge used by the SDK and the CLI.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
