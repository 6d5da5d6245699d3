//! Error types for store and adapter operations.

/// Errors returned by persistence adapters and store helpers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The write would exceed the adapter's storage quota.
    #[error("storage quota exceeded (needed={needed}, quota={quota})")]
    QuotaExceeded { needed: usize, quota: usize },
    /// Caller input was rejected before any IO.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
}
