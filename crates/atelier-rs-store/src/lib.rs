//! Bounded, persisted record collections for Atelier.
//!
//! A collection keeps its records newest first, caps its length, and writes
//! the whole list through a [`PersistenceAdapter`] after every mutation. When
//! a write fails it keeps only the newest records and retries once; the
//! in-memory list is never rolled back.

pub mod adapter;
pub mod collection;
pub mod conversation;
pub mod error;
pub mod factory;
pub mod payload;
pub mod record;

/// Persistence adapters.
pub use adapter::{FileAdapter, MemoryAdapter, PersistenceAdapter};
/// Bounded collection and its outcomes.
pub use collection::{
    ALL_TAGS, AddOutcome, BoundedCollection, CollectionOptions, DEFAULT_DEGRADE_RETAIN,
    DEFAULT_MAX_SIZE, PersistStatus,
};
/// Conversation book.
pub use conversation::{ConversationBook, ConversationOptions};
/// Store error type.
pub use error::StoreError;
/// Record factory helpers.
pub use factory::{GALLERY_KEYWORDS, IdStrategy, RecordFactory, keyword_tags, model_display_name};
/// Concrete payloads.
pub use payload::{
    ChatMessage, ChatRole, Conversation, GalleryImage, ImageHistoryEntry, PromptEntry,
    PromptHistory,
};
/// Record model.
pub use record::{Payload, Record, RecordId};
