//! Test helpers shared across Atelier crates.

pub mod adapter;
pub mod chat;
pub mod generator;

pub use adapter::FlakyAdapter;
pub use chat::{FailingChat, FixedChat, RecordingChat};
pub use generator::{FixedGenerator, ScriptedGenerator};
