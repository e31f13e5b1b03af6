//! In-memory store implementations.
//!
//! Back the same traits as the sqlx repositories so the realtime engine
//! and API layer can be exercised in tests without PostgreSQL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{ConversationId, MessageId, UserId};
use campushub_entity::conversation::{Conversation, canonical_pair};
use campushub_entity::message::{Message, NewMessage};
use campushub_entity::user::User;

use crate::store::{ConversationStore, MessageStore, UserDirectory};

/// In-memory conversation store keyed by the canonical participant pair.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    inner: Mutex<HashMap<(UserId, UserId), Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the conversation's last-message pointer. The sqlx
    /// repository does this inside the insert transaction; here the
    /// message store calls it after recording a message.
    pub fn advance_pointer(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        at: DateTime<Utc>,
    ) {
        let mut map = self.inner.lock().unwrap();
        if let Some(conversation) = map.values_mut().find(|c| c.id == conversation_id) {
            conversation.last_message_id = Some(message_id);
            conversation.last_message_at = Some(at);
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find_or_create(&self, a: UserId, b: UserId) -> AppResult<Conversation> {
        if a == b {
            return Err(AppError::validation(
                "A conversation requires two distinct participants",
            ));
        }
        let pair = canonical_pair(a, b);
        let mut map = self.inner.lock().unwrap();
        let conversation = map.entry(pair).or_insert_with(|| Conversation {
            id: ConversationId::new(),
            participant_a: pair.0,
            participant_b: pair.1,
            created_at: Utc::now(),
            last_message_id: None,
            last_message_at: None,
        });
        Ok(conversation.clone())
    }

    async fn get(&self, id: ConversationId) -> AppResult<Option<Conversation>> {
        let map = self.inner.lock().unwrap();
        Ok(map.values().find(|c| c.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Conversation>> {
        let map = self.inner.lock().unwrap();
        let mut conversations: Vec<Conversation> = map
            .values()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| {
            let a_key = a.last_message_at.unwrap_or(a.created_at);
            let b_key = b.last_message_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key)
        });
        Ok(conversations)
    }
}

/// In-memory message store.
///
/// Shares the conversation store so inserts advance the last-message
/// pointer the same way the sqlx repository's transaction does.
/// Insertion order is kept as the tie-break when two messages share a
/// timestamp, mirroring the id tie-break in the SQL ordering.
#[derive(Debug)]
pub struct MemoryMessageStore {
    conversations: Arc<MemoryConversationStore>,
    messages: Mutex<Vec<Message>>,
}

impl MemoryMessageStore {
    pub fn new(conversations: Arc<MemoryConversationStore>) -> Self {
        Self {
            conversations,
            messages: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, new: NewMessage, created_at: DateTime<Utc>) -> Message {
        let message = Message {
            id: MessageId::new(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            content: new.content,
            attachment_ref: new.attachment_ref,
            read_by: vec![new.sender_id],
            created_at,
            edited_at: None,
        };
        self.messages.lock().unwrap().push(message.clone());
        self.conversations
            .advance_pointer(message.conversation_id, message.id, message.created_at);
        message
    }

    /// Records a message with an explicit creation instant, for fixtures
    /// that need out-of-order arrival.
    #[cfg(test)]
    fn insert_at(&self, new: NewMessage, created_at: DateTime<Utc>) -> Message {
        self.record(new, created_at)
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, new: NewMessage) -> AppResult<Message> {
        Ok(self.record(new, Utc::now()))
    }

    async fn get(&self, id: MessageId) -> AppResult<Option<Message>> {
        let messages = self.messages.lock().unwrap();
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list(
        &self,
        conversation_id: ConversationId,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Message>> {
        let messages = self.messages.lock().unwrap();
        let mut matching: Vec<(usize, &Message)> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.conversation_id == conversation_id)
            .collect();
        matching.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> AppResult<u64> {
        let mut messages = self.messages.lock().unwrap();
        let mut updated = 0u64;
        for message in messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id)
        {
            if !message.read_by.contains(&user_id) {
                message.read_by.push(user_id);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<UserId, User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so lookups resolve.
    pub fn add(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}
