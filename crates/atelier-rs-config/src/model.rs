//! Configuration schema for Atelier.

use atelier_rs_store::{CollectionOptions, ConversationOptions, IdStrategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root config for the Atelier stores and generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtelierConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "CollectionConfig::gallery")]
    pub gallery: CollectionConfig,
    #[serde(default = "CollectionConfig::image_history")]
    pub image_history: CollectionConfig,
    #[serde(default = "CollectionConfig::prompt_history")]
    pub prompt_history: CollectionConfig,
    #[serde(default)]
    pub conversations: ConversationsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for AtelierConfig {
    fn default() -> Self {
        Self {
            schema: None,
            storage: StorageConfig::default(),
            gallery: CollectionConfig::gallery(),
            image_history: CollectionConfig::image_history(),
            prompt_history: CollectionConfig::prompt_history(),
            conversations: ConversationsConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AtelierConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> AtelierConfigBuilder {
        AtelierConfigBuilder::new()
    }
}

/// Builder for assembling an `AtelierConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct AtelierConfigBuilder {
    config: AtelierConfig,
}

impl AtelierConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: AtelierConfig::default(),
        }
    }

    /// Set the directory persisted collections are written to.
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.storage.root = Some(root.into());
        self
    }

    /// Replace the gallery sizing.
    pub fn gallery(mut self, gallery: CollectionConfig) -> Self {
        self.config.gallery = gallery;
        self
    }

    /// Replace the image history sizing.
    pub fn image_history(mut self, image_history: CollectionConfig) -> Self {
        self.config.image_history = image_history;
        self
    }

    /// Replace the prompt history sizing.
    pub fn prompt_history(mut self, prompt_history: CollectionConfig) -> Self {
        self.config.prompt_history = prompt_history;
        self
    }

    /// Replace the conversation settings.
    pub fn conversations(mut self, conversations: ConversationsConfig) -> Self {
        self.config.conversations = conversations;
        self
    }

    /// Replace the generation settings.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Finalize and return the built `AtelierConfig`.
    pub fn build(self) -> AtelierConfig {
        self.config
    }
}

/// Where persisted collections live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory; defaults to `~/.atelier/data`.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Sizing of one bounded collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    pub max_size: usize,
    #[serde(default = "default_degrade_retain")]
    pub degrade_retain: usize,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

impl CollectionConfig {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            degrade_retain: default_degrade_retain(),
            id_strategy: IdStrategy::default(),
        }
    }

    fn gallery() -> Self {
        Self::new(50)
    }

    fn image_history() -> Self {
        Self::new(50)
    }

    fn prompt_history() -> Self {
        Self::new(100)
    }

    /// Store options for this sizing. `degrade_retain` is capped at `max_size`.
    pub fn options(&self) -> CollectionOptions {
        CollectionOptions::new(self.max_size)
            .with_degrade_retain(self.degrade_retain.min(self.max_size))
            .with_id_strategy(self.id_strategy)
    }
}

fn default_degrade_retain() -> usize {
    10
}

/// Conversation book settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationsConfig {
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_degrade_retain")]
    pub degrade_retain: usize,
    #[serde(default = "default_chat_model")]
    pub default_model: String,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

impl Default for ConversationsConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            max_messages: default_max_messages(),
            degrade_retain: default_degrade_retain(),
            default_model: default_chat_model(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

impl ConversationsConfig {
    /// Conversation book options for these settings.
    pub fn options(&self) -> ConversationOptions {
        ConversationOptions {
            collection: CollectionOptions::new(self.max_conversations)
                .with_degrade_retain(self.degrade_retain.min(self.max_conversations)),
            max_messages: self.max_messages,
            default_model: self.default_model.clone(),
            title_max_chars: self.title_max_chars,
            ..ConversationOptions::default()
        }
    }
}

fn default_max_conversations() -> usize {
    50
}

fn default_max_messages() -> usize {
    100
}

fn default_chat_model() -> String {
    "gpt-5.1-chat".to_string()
}

fn default_title_max_chars() -> usize {
    30
}

/// Image generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
    #[serde(default = "default_image_model")]
    pub default_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            item_timeout_secs: default_item_timeout_secs(),
            default_model: default_image_model(),
        }
    }
}

impl GenerationConfig {
    /// Per-item timeout as a duration.
    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

fn default_batch_size() -> usize {
    4
}

fn default_item_timeout_secs() -> u64 {
    60
}

fn default_image_model() -> String {
    "google/gemini-3-pro-image".to_string()
}
