//! Concrete payload shapes stored by the studio.

pub mod conversation;
pub mod image;
pub mod prompt;

pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use image::{DEFAULT_ASPECT_RATIO, GalleryImage, ImageHistoryEntry};
pub use prompt::{DEFAULT_PROMPT_HISTORY_SIZE, PromptEntry, PromptHistory};
