//! Conversation book: bounded conversation list with an active conversation.

use crate::adapter::PersistenceAdapter;
use crate::collection::{AddOutcome, BoundedCollection, CollectionOptions, PersistStatus};
use crate::error::StoreError;
use crate::payload::{ChatMessage, ChatRole, Conversation};
use crate::record::{Record, RecordId};
use chrono::Utc;
use log::{debug, info};

/// Options for a conversation book.
#[derive(Debug, Clone)]
pub struct ConversationOptions {
    /// Sizing of the conversation list.
    pub collection: CollectionOptions,
    /// Messages kept per conversation; older messages are dropped.
    pub max_messages: usize,
    /// Model assigned to new conversations.
    pub default_model: String,
    /// Title given to new conversations.
    pub default_title: String,
    /// Characters of the first user message used as the title.
    pub title_max_chars: usize,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            collection: CollectionOptions::new(50),
            max_messages: 100,
            default_model: "gpt-5.1-chat".to_string(),
            default_title: "New chat".to_string(),
            title_max_chars: 30,
        }
    }
}

/// Conversations, newest first, with exactly one active conversation.
pub struct ConversationBook<A> {
    conversations: BoundedCollection<Conversation, A>,
    active: Option<RecordId>,
    options: ConversationOptions,
}

impl<A: PersistenceAdapter> ConversationBook<A> {
    /// Collection name, also the persisted file name.
    pub const NAME: &'static str = "conversations";

    /// Load conversations and activate the most recent, creating one if none exist.
    pub fn open(adapter: A, options: ConversationOptions) -> Self {
        let conversations =
            BoundedCollection::initialize(Self::NAME, adapter, options.collection);
        let mut book = Self {
            conversations,
            active: None,
            options,
        };
        book.ensure_active();
        book
    }

    /// Start a new conversation and make it active.
    pub fn create(&mut self, title: Option<&str>) -> AddOutcome<Conversation> {
        let title = title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.options.default_title)
            .to_string();
        let outcome = self.conversations.add(Conversation::new(
            title,
            self.options.default_model.clone(),
        ));
        info!("created conversation (id={})", outcome.record.id());
        self.active = Some(outcome.record.id().clone());
        self.ensure_active();
        outcome
    }

    /// Make `id` the active conversation.
    pub fn switch(&mut self, id: &RecordId) -> Result<(), StoreError> {
        if self.conversations.get(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!("switched conversation (id={})", id);
        self.active = Some(id.clone());
        Ok(())
    }

    /// Delete a conversation.
    ///
    /// Deleting the active conversation activates the next most recent one,
    /// or a fresh conversation when none remain.
    pub fn delete(&mut self, id: &RecordId) -> PersistStatus {
        let status = self.conversations.delete(id);
        if status == PersistStatus::Unchanged {
            return status;
        }
        info!("deleted conversation (id={})", id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        match self.ensure_active() {
            Some(created) => created,
            None => status,
        }
    }

    /// The active conversation.
    pub fn active(&self) -> Option<&Record<Conversation>> {
        self.active
            .as_ref()
            .and_then(|id| self.conversations.get(id))
    }

    /// Id of the active conversation.
    pub fn active_id(&self) -> Option<&RecordId> {
        self.active.as_ref()
    }

    /// Conversations, newest first.
    pub fn conversations(&self) -> &[Record<Conversation>] {
        self.conversations.list()
    }

    /// Look up a conversation.
    pub fn get(&self, id: &RecordId) -> Option<&Record<Conversation>> {
        self.conversations.get(id)
    }

    /// Conversations whose title contains `query`, case-insensitively.
    pub fn search_titles(&self, query: Option<&str>) -> Vec<&Record<Conversation>> {
        self.conversations.search(query)
    }

    /// Append a message to the active conversation.
    ///
    /// The first user message of a conversation becomes its title.
    pub fn add_message(
        &mut self,
        role: ChatRole,
        content: &str,
    ) -> Result<(ChatMessage, PersistStatus), StoreError> {
        if content.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "message content must not be empty".to_string(),
            ));
        }
        let id = self.require_active()?;
        let message = ChatMessage::new(role, content);
        let max_messages = self.options.max_messages;
        let title_max_chars = self.options.title_max_chars;
        let stored = message.clone();
        let (_, status) = self
            .conversations
            .modify(&id, move |conversation| {
                conversation.messages.push(stored);
                if conversation.messages.len() > max_messages {
                    let overflow = conversation.messages.len() - max_messages;
                    conversation.messages.drain(..overflow);
                }
                conversation.updated_at = Utc::now();
                if role == ChatRole::User && conversation.messages.len() == 1 {
                    conversation.title = title_from(content, title_max_chars);
                }
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        debug!(
            "appended message (conversation_id={}, role={}, content_len={})",
            id,
            role.as_str(),
            content.len()
        );
        self.ensure_active();
        Ok((message, status))
    }

    /// Remove one message from the active conversation. Absent ids are a no-op.
    pub fn delete_message(&mut self, message_id: &RecordId) -> Result<PersistStatus, StoreError> {
        let id = self.require_active()?;
        let present = self
            .active()
            .is_some_and(|record| record.payload().messages.iter().any(|m| &m.id == message_id));
        if !present {
            return Ok(PersistStatus::Unchanged);
        }
        let status = self.modify_active(&id, |conversation| {
            conversation.messages.retain(|message| &message.id != message_id);
        })?;
        Ok(status)
    }

    /// Remove every message from the active conversation.
    pub fn clear_messages(&mut self) -> Result<PersistStatus, StoreError> {
        let id = self.require_active()?;
        self.modify_active(&id, |conversation| conversation.messages.clear())
    }

    /// Change the model used by the active conversation.
    pub fn set_model(&mut self, model: &str) -> Result<PersistStatus, StoreError> {
        if model.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "model must not be empty".to_string(),
            ));
        }
        let id = self.require_active()?;
        let model = model.to_string();
        self.modify_active(&id, move |conversation| conversation.model = model)
    }

    /// Remove an assistant reply and return the user prompt that preceded it.
    pub fn pop_reply(
        &mut self,
        message_id: &RecordId,
    ) -> Result<(String, PersistStatus), StoreError> {
        let id = self.require_active()?;
        let conversation = self
            .active()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .payload();
        let index = conversation
            .messages
            .iter()
            .position(|message| &message.id == message_id)
            .ok_or_else(|| StoreError::NotFound(message_id.to_string()))?;
        if conversation.messages[index].role != ChatRole::Assistant {
            return Err(StoreError::InvalidInput(format!(
                "message {message_id} is not an assistant reply"
            )));
        }
        let prompt = conversation.messages[..index]
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.content.clone())
            .ok_or_else(|| {
                StoreError::InvalidInput(format!("no user prompt precedes message {message_id}"))
            })?;
        let status = self.modify_active(&id, |conversation| {
            conversation.messages.remove(index);
        })?;
        Ok((prompt, status))
    }

    /// Backing collection.
    pub fn collection(&self) -> &BoundedCollection<Conversation, A> {
        &self.conversations
    }

    fn require_active(&mut self) -> Result<RecordId, StoreError> {
        self.ensure_active();
        self.active
            .clone()
            .ok_or_else(|| StoreError::NotFound("active conversation".to_string()))
    }

    fn modify_active(
        &mut self,
        id: &RecordId,
        f: impl FnOnce(&mut Conversation),
    ) -> Result<PersistStatus, StoreError> {
        let (_, status) = self
            .conversations
            .modify(id, move |conversation| {
                f(conversation);
                conversation.updated_at = Utc::now();
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.ensure_active();
        Ok(status)
    }

    /// Repair the active pointer after deletes or evictions.
    ///
    /// Returns the persistence status when a fresh conversation had to be created.
    fn ensure_active(&mut self) -> Option<PersistStatus> {
        if let Some(id) = &self.active
            && self.conversations.get(id).is_some()
        {
            return None;
        }
        if let Some(first) = self.conversations.list().first() {
            self.active = Some(first.id().clone());
            return None;
        }
        let outcome = self.conversations.add(Conversation::new(
            self.options.default_title.clone(),
            self.options.default_model.clone(),
        ));
        info!("created empty conversation (id={})", outcome.record.id());
        self.active = Some(outcome.record.id().clone());
        Some(outcome.status)
    }
}

fn title_from(content: &str, max_chars: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut title: String = content.chars().take(max_chars).collect();
    title.push_str("...");
    title
}
