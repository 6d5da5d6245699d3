//! Error types for the studio composition root.

use atelier_rs_config::ConfigError;
use atelier_rs_generation::GenerationError;
use atelier_rs_store::StoreError;
use thiserror::Error;

/// Errors returned by studio operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Config failed to load or validate.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Store rejected the input or an adapter could not be built.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Generation or chat call failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// No image generator was attached to the studio.
    #[error("no image generator configured")]
    NoGenerator,
    /// No chat client was attached to the studio.
    #[error("no chat client configured")]
    NoChatClient,
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
