//! Image payloads for the gallery and the generation history.

use crate::factory::{GALLERY_KEYWORDS, keyword_tags, model_display_name};
use crate::record::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Aspect ratio recorded when the caller supplies none.
pub const DEFAULT_ASPECT_RATIO: &str = "1024x1024";

/// Image saved to the gallery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    /// Data URL or reference to the image bytes.
    pub image_data: String,
    /// Prompt the image was generated from.
    pub prompt: String,
    /// Model identifier.
    pub model: String,
    /// Display name derived from the model identifier.
    pub model_name: String,
    /// Style preset key, if any.
    #[serde(default)]
    pub style: Option<String>,
    /// Auxiliary generation parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl GalleryImage {
    /// Build a gallery image, deriving the model display name.
    pub fn new(
        image_data: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        Self {
            image_data: image_data.into(),
            prompt: prompt.into(),
            model_name: model_display_name(&model),
            model,
            style: None,
            params: Map::new(),
        }
    }

    /// Attach a style preset key. Empty keys are ignored.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        let style = style.into();
        self.style = (!style.trim().is_empty()).then_some(style);
        self
    }

    /// Attach one generation parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl Payload for GalleryImage {
    fn search_text(&self) -> &str {
        &self.prompt
    }

    /// Style first, then gallery keywords found in the prompt.
    fn derive_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(style) = &self.style {
            tags.push(style.clone());
        }
        for tag in keyword_tags(&self.prompt, GALLERY_KEYWORDS) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// Entry in the generation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageHistoryEntry {
    pub image_data: String,
    pub prompt: String,
    pub model: String,
    pub model_name: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

fn default_aspect_ratio() -> String {
    DEFAULT_ASPECT_RATIO.to_string()
}

impl ImageHistoryEntry {
    pub fn new(
        image_data: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
        aspect_ratio: Option<&str>,
    ) -> Self {
        let model = model.into();
        Self {
            image_data: image_data.into(),
            prompt: prompt.into(),
            model_name: model_display_name(&model),
            model,
            aspect_ratio: aspect_ratio.unwrap_or(DEFAULT_ASPECT_RATIO).to_string(),
        }
    }
}

impl Payload for ImageHistoryEntry {
    fn search_text(&self) -> &str {
        &self.prompt
    }
}
