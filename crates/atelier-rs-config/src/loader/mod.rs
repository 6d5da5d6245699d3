//! Layered configuration loader.
//!
//! Discovers the user and working-directory layers, applies runtime
//! overrides, merges them over the defaults and validates the result.

mod layer_io;
mod merge;

#[cfg(test)]
mod tests;

use crate::{AtelierConfig, ConfigError};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "atelier.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".atelier";
/// Default data directory under the config directory.
const DEFAULT_DATA_DIR: &str = "data";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: AtelierConfig,
    /// Metadata for each layer that contributed.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk.
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory holding the cwd layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.atelier/atelier.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl AtelierConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(&value)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(&value)
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): defaults, user, cwd, runtime overrides.
    /// A missing user or cwd layer is skipped; a missing runtime path is an
    /// error.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        let optional = [
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (ConfigLayerSource::Cwd, Some(cwd.join(DEFAULT_CONFIG_FILE))),
        ];
        for (source, path) in optional {
            let Some(path) = path else { continue };
            if !seen_paths.insert(layer_io::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if let Some(layer) = layer_io::load_optional_layer(source, &path)? {
                merge::merge_json_values(&mut merged, &layer.value);
                layers.push(layer.meta);
            }
        }

        for runtime_path in &options.runtime_paths {
            let layer = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            merge::merge_json_values(&mut merged, &layer.value);
            layers.push(layer.meta);
        }

        let config = config_from_value(&merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Directory persisted collections are written to.
    ///
    /// Relative roots resolve against `base`. Without a configured root this
    /// is `~/.atelier/data`, falling back to `base/.atelier/data` when no home
    /// directory is known.
    pub fn storage_root(&self, base: impl AsRef<Path>) -> PathBuf {
        match &self.storage.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.as_ref().join(root),
            None => layer_io::default_config_dir()
                .unwrap_or_else(|| base.as_ref().join(DEFAULT_CONFIG_DIR))
                .join(DEFAULT_DATA_DIR),
        }
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (path, collection) in [
            ("gallery", &self.gallery),
            ("image_history", &self.image_history),
            ("prompt_history", &self.prompt_history),
        ] {
            check_max_size(path, collection.max_size)?;
        }

        let conversations = &self.conversations;
        check_max_size("conversations", conversations.max_conversations)?;
        check_positive(
            "conversations.max_messages",
            conversations.max_messages as u64,
        )?;
        check_positive(
            "conversations.title_max_chars",
            conversations.title_max_chars as u64,
        )?;
        check_positive("generation.batch_size", self.generation.batch_size as u64)?;
        check_positive(
            "generation.item_timeout_secs",
            self.generation.item_timeout_secs,
        )?;
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

/// Decode a (possibly partial) config document over the defaults.
fn decode_over_defaults(value: &Value) -> Result<AtelierConfig, ConfigError> {
    let mut base = serde_json::to_value(AtelierConfig::default())?;
    merge::merge_json_values(&mut base, value);
    Ok(serde_json::from_value(base)?)
}

fn config_from_value(value: &Value) -> Result<AtelierConfig, ConfigError> {
    let config = decode_over_defaults(value)?;
    config.validate()?;
    Ok(config)
}

fn check_max_size(path: &str, max_size: usize) -> Result<(), ConfigError> {
    if max_size == 0 {
        return Err(invalid_field(path, "max size must be at least 1"));
    }
    Ok(())
}

fn check_positive(path: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid_field(path, "must be greater than zero"));
    }
    Ok(())
}

fn invalid_field(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}
