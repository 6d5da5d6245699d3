use async_trait::async_trait;
use atelier_rs_generation::{ChatClient, ChatOptions, GenerationError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Chat client that always replies with the same text.
#[derive(Debug, Clone)]
pub struct FixedChat {
    reply: String,
}

impl FixedChat {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ChatClient for FixedChat {
    async fn chat(&self, _message: &str, _options: &ChatOptions) -> Result<String, GenerationError> {
        Ok(self.reply.clone())
    }
}

/// Chat client that always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingChat {
    error: GenerationError,
}

impl FailingChat {
    pub fn new(error: GenerationError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl ChatClient for FailingChat {
    async fn chat(&self, _message: &str, _options: &ChatOptions) -> Result<String, GenerationError> {
        Err(self.error.clone())
    }
}

/// Chat client that replays queued replies and records what it was sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingChat {
    replies: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingChat {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chat = Self::default();
        chat.replies
            .lock()
            .extend(replies.into_iter().map(|reply| Ok(reply.into())));
        chat
    }

    /// Queue a failure after the current replies.
    pub fn push_error(&self, error: GenerationError) {
        self.replies.lock().push_back(Err(error));
    }

    /// `(model, message)` pairs received, in call order.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn chat(&self, message: &str, options: &ChatOptions) -> Result<String, GenerationError> {
        self.seen
            .lock()
            .push((options.model.clone(), message.to_string()));
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Provider("no scripted reply".to_string())))
    }
}
