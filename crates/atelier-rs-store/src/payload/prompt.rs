//! Prompt history: recently used prompts without duplicates.

use crate::adapter::PersistenceAdapter;
use crate::collection::{BoundedCollection, CollectionOptions, PersistStatus};
use crate::record::{Payload, Record};
use serde::{Deserialize, Serialize};

/// Default number of prompts remembered.
pub const DEFAULT_PROMPT_HISTORY_SIZE: usize = 100;

/// One remembered prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptEntry {
    pub prompt: String,
}

impl Payload for PromptEntry {
    fn search_text(&self) -> &str {
        &self.prompt
    }
}

/// Bounded prompt history that skips prompts it already holds.
pub struct PromptHistory<A> {
    collection: BoundedCollection<PromptEntry, A>,
}

impl<A: PersistenceAdapter> PromptHistory<A> {
    /// Collection name, also the persisted file name.
    pub const NAME: &'static str = "prompt_history";

    /// Load the history from its adapter.
    pub fn initialize(adapter: A, options: CollectionOptions) -> Self {
        Self {
            collection: BoundedCollection::initialize(Self::NAME, adapter, options),
        }
    }

    /// Remember `prompt` unless it is blank or already present.
    pub fn record(&mut self, prompt: &str) -> PersistStatus {
        let prompt = prompt.trim();
        if prompt.is_empty()
            || self
                .collection
                .iter()
                .any(|record| record.payload().prompt == prompt)
        {
            return PersistStatus::Unchanged;
        }
        self.collection
            .add(PromptEntry {
                prompt: prompt.to_string(),
            })
            .status
    }

    /// Prompts, most recent first.
    pub fn prompts(&self) -> Vec<&str> {
        self.collection
            .iter()
            .map(|record| record.payload().prompt.as_str())
            .collect()
    }

    /// Underlying records, most recent first.
    pub fn list(&self) -> &[Record<PromptEntry>] {
        self.collection.list()
    }

    /// Search remembered prompts.
    pub fn search(&self, query: Option<&str>) -> Vec<&Record<PromptEntry>> {
        self.collection.search(query)
    }

    /// Forget every prompt.
    pub fn clear(&mut self) -> PersistStatus {
        self.collection.clear()
    }

    /// Backing collection.
    pub fn collection(&self) -> &BoundedCollection<PromptEntry, A> {
        &self.collection
    }
}
