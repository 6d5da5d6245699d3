//! Record model shared by every bounded collection.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Domain payload stored inside a [`Record`].
pub trait Payload: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Text matched by case-insensitive search.
    fn search_text(&self) -> &str;

    /// Classification labels computed once when the record is created.
    fn derive_tags(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Record identifier, unique within one collection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Accept string ids and the numeric ids written by older browser exports.
impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// One stored item. Built only by the record factory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<P> {
    id: RecordId,
    created_at: DateTime<Utc>,
    payload: P,
    #[serde(default)]
    tags: Vec<String>,
}

impl<P> Record<P> {
    pub(crate) fn new(
        id: RecordId,
        created_at: DateTime<Utc>,
        payload: P,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id,
            created_at,
            payload,
            tags,
        }
    }

    /// Record identifier.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Capture timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Domain payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Tags derived at insertion time.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Consume the record and return its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}
