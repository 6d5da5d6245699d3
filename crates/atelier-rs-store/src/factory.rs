//! Record construction: identity, timestamps and derived fields.

use crate::record::{Payload, Record, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Keywords the gallery tags images with when they appear in the prompt.
pub const GALLERY_KEYWORDS: &[&str] = &[
    "portrait",
    "landscape",
    "abstract",
    "character",
    "animal",
    "nature",
    "city",
    "fantasy",
];

/// Friendly names for model ids whose last path segment reads poorly.
const MODEL_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("google/gemini-3-pro-image", "Gemini 3 Pro Image"),
    ("gemini-2.5-flash-image-preview", "Gemini 2.5 Flash Image"),
];

/// How record identifiers are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Millisecond timestamp with a random 16-bit suffix.
    ///
    /// Two records created in the same millisecond collide with probability
    /// 1/65536 per pair; nothing checks for it.
    Timestamp,
    /// Random v4 uuid.
    #[default]
    Uuid,
}

/// Builds records from caller payloads. No IO.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFactory {
    strategy: IdStrategy,
}

impl RecordFactory {
    /// Factory using the given id strategy.
    pub fn new(strategy: IdStrategy) -> Self {
        Self { strategy }
    }

    /// Id strategy in use.
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Create a record stamped with the current time.
    pub fn create<P: Payload>(&self, payload: P) -> Record<P> {
        self.create_at(payload, Utc::now())
    }

    /// Create a record stamped with `now`.
    pub fn create_at<P: Payload>(&self, payload: P, now: DateTime<Utc>) -> Record<P> {
        let id = self.next_id(now);
        let tags = payload.derive_tags();
        Record::new(id, now, payload, tags)
    }

    fn next_id(&self, now: DateTime<Utc>) -> RecordId {
        match self.strategy {
            IdStrategy::Timestamp => RecordId::from(format!(
                "{}-{:04x}",
                now.timestamp_millis(),
                rand::random::<u16>()
            )),
            IdStrategy::Uuid => RecordId::from(Uuid::new_v4().to_string()),
        }
    }
}

/// Short display name for a model id.
///
/// Known ids map to a friendly name, anything else to its last `/` segment.
pub fn model_display_name(model: &str) -> String {
    if let Some((_, name)) = MODEL_DISPLAY_NAMES.iter().find(|(id, _)| *id == model) {
        return (*name).to_string();
    }
    match model.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => model.to_string(),
    }
}

/// Keywords contained in `text`, compared case-insensitively, in list order.
pub fn keyword_tags(text: &str, keywords: &[&str]) -> Vec<String> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect()
}
