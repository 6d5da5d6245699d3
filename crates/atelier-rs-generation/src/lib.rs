//! Generation boundary for the atelier stores.
//!
//! Defines the hosted image and chat operations as traits, classifies their
//! errors for display, composes styled prompts and runs batch fan-out with a
//! per-item timeout. Transport is left to implementors.

pub mod batch;
pub mod error;
pub mod prompt;
pub mod provider;

pub use batch::{
    BatchEvent, BatchFanOut, BatchReport, DEFAULT_BATCH_SIZE, DEFAULT_ITEM_TIMEOUT, ItemOutcome,
};
pub use error::{ErrorCategory, GenerationError};
pub use prompt::{
    Resolution, STYLE_PRESETS, compose_prompt, style_suffix, validate_prompt, variant_prompt,
};
pub use provider::{ChatClient, ChatOptions, GeneratedImage, GenerationOptions, ImageGenerator};
