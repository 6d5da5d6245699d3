//! Error types for generation and chat calls.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by generators, chat clients and the batch runner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Caller input was rejected before any request was issued.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The item did not finish within its timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The provider requires the user to sign in.
    #[error("authentication required: {0}")]
    Authentication(String),
    /// Transport failure talking to the provider.
    #[error("network error: {0}")]
    Network(String),
    /// The provider refused the prompt.
    #[error("rejected by content policy: {0}")]
    ContentPolicy(String),
    /// Any other provider failure.
    #[error("provider error: {0}")]
    Provider(String),
    /// The request task panicked or was aborted.
    #[error("request task failed: {0}")]
    TaskFailed(String),
}

/// Display grouping of a [`GenerationError`]. Never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Timeout,
    Network,
    ContentPolicy,
    InvalidInput,
    Other,
}

impl GenerationError {
    /// Category used when rendering the error.
    ///
    /// Generic provider messages are classified by their text.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GenerationError::InvalidInput(_) => ErrorCategory::InvalidInput,
            GenerationError::Timeout(_) => ErrorCategory::Timeout,
            GenerationError::Authentication(_) => ErrorCategory::Authentication,
            GenerationError::Network(_) => ErrorCategory::Network,
            GenerationError::ContentPolicy(_) => ErrorCategory::ContentPolicy,
            GenerationError::Provider(message) | GenerationError::TaskFailed(message) => {
                classify_message(message)
            }
        }
    }

    /// Short user-facing message for the error's category.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Authentication => "Not signed in, please sign in first".to_string(),
            ErrorCategory::Timeout => "Request timed out, please retry".to_string(),
            ErrorCategory::Network => "Network error, please check your connection".to_string(),
            _ => self.to_string(),
        }
    }
}

fn classify_message(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();
    if lowered.contains("not signed in") || lowered.contains("authentication") {
        ErrorCategory::Authentication
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        ErrorCategory::Timeout
    } else if lowered.contains("network") {
        ErrorCategory::Network
    } else if lowered.contains("content policy") || lowered.contains("safety") {
        ErrorCategory::ContentPolicy
    } else {
        ErrorCategory::Other
    }
}
