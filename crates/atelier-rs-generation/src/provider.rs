//! Boundary traits for the hosted image generation and chat services.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options passed to an image generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier.
    pub model: String,
    /// Aspect ratio such as `1024x1024` or `16:9`.
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    /// Provider specific parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl GenerationOptions {
    /// Options for `model` with no extra parameters.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    /// Set one provider parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A generated image ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Data URL or reference to the image bytes.
    pub image_data: String,
}

/// Options passed to a chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Model identifier.
    pub model: String,
}

/// Hosted text-to-image operation.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedImage, GenerationError>;
}

/// Hosted chat completion operation.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one message and return the reply text.
    async fn chat(&self, message: &str, options: &ChatOptions) -> Result<String, GenerationError>;
}
