//! Chat turns against the active conversation.

use crate::error::CoreError;
use crate::studio::Studio;
use atelier_rs_generation::{ChatClient, ChatOptions, GenerationError};
use atelier_rs_store::{
    ChatMessage, ChatRole, ConversationBook, PersistStatus, PersistenceAdapter, RecordId,
};
use log::{debug, warn};
use std::sync::Arc;

/// Prefix of the assistant message appended when a chat call fails.
pub const APOLOGY_PREFIX: &str = "Sorry, something went wrong: ";

/// Messages appended by one chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    /// The user message, absent for a regenerated reply.
    pub user: Option<ChatMessage>,
    pub reply: ChatMessage,
    /// Outcome of the last write of the turn.
    pub status: PersistStatus,
}

impl<A: PersistenceAdapter> Studio<A> {
    /// Send `text` in the active conversation and append the reply.
    ///
    /// When the chat call fails or returns a blank reply, an apology is
    /// appended as the assistant's reply and the error is returned.
    pub async fn send_message(&self, text: &str) -> Result<ChatTurn, CoreError> {
        let client = self.chat_client()?;
        let text = text.trim();
        let (user, model) = {
            let mut book = self.conversations.lock();
            let (message, _) = book.add_message(ChatRole::User, text)?;
            (message, self.active_model(&book))
        };
        debug!("sending chat message (model={}, len={})", model, text.len());
        let mut turn = self.complete_turn(client, text, model).await?;
        turn.user = Some(user);
        Ok(turn)
    }

    /// Replace an assistant reply with a fresh answer to the prompt before it.
    pub async fn regenerate(&self, reply_id: &RecordId) -> Result<ChatTurn, CoreError> {
        let client = self.chat_client()?;
        let (prompt, model) = {
            let mut book = self.conversations.lock();
            let (prompt, _) = book.pop_reply(reply_id)?;
            (prompt, self.active_model(&book))
        };
        debug!("regenerating reply (reply_id={}, model={})", reply_id, model);
        self.complete_turn(client, &prompt, model).await
    }

    fn active_model(&self, book: &ConversationBook<A>) -> String {
        book.active()
            .map(|record| record.payload().model.clone())
            .unwrap_or_else(|| self.config.conversations.default_model.clone())
    }

    fn chat_client(&self) -> Result<Arc<dyn ChatClient>, CoreError> {
        self.chat.clone().ok_or(CoreError::NoChatClient)
    }

    async fn complete_turn(
        &self,
        client: Arc<dyn ChatClient>,
        prompt: &str,
        model: String,
    ) -> Result<ChatTurn, CoreError> {
        let result = client
            .chat(prompt, &ChatOptions { model })
            .await
            .and_then(|reply| {
                if reply.trim().is_empty() {
                    Err(GenerationError::Provider(
                        "chat model returned an empty reply".to_string(),
                    ))
                } else {
                    Ok(reply)
                }
            });
        let mut book = self.conversations.lock();
        match result {
            Ok(reply) => {
                let (reply, status) = book.add_message(ChatRole::Assistant, &reply)?;
                Ok(ChatTurn {
                    user: None,
                    reply,
                    status,
                })
            }
            Err(err) => {
                warn!("chat call failed (error={})", err);
                book.add_message(ChatRole::Assistant, &apology(&err))?;
                Err(err.into())
            }
        }
    }
}

fn apology(err: &GenerationError) -> String {
    format!("{APOLOGY_PREFIX}{}", err.user_message())
}
