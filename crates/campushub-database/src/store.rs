//! Durable store client traits.
//!
//! The realtime engine consumes these contracts; the sqlx repositories
//! and the in-memory implementations both satisfy them, so tests can
//! assert on behavior without a running database.

use async_trait::async_trait;

use campushub_core::result::AppResult;
use campushub_core::types::{ConversationId, MessageId, UserId};
use campushub_entity::conversation::Conversation;
use campushub_entity::message::{Message, NewMessage};
use campushub_entity::user::User;

/// Conversation lookup and idempotent creation.
#[async_trait]
pub trait ConversationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find the conversation between the unordered pair, creating it on
    /// first contact. Idempotent: the same pair (in either order) always
    /// yields the same conversation.
    async fn find_or_create(&self, a: UserId, b: UserId) -> AppResult<Conversation>;

    /// Load a conversation by id.
    async fn get(&self, id: ConversationId) -> AppResult<Option<Conversation>>;

    /// List conversations the user participates in, most recent activity
    /// first.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Conversation>>;
}

/// Message persistence and query.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a message with a UTC creation instant and advance the
    /// conversation's last-message pointer.
    async fn insert(&self, new: NewMessage) -> AppResult<Message>;

    /// Load a single message by id.
    async fn get(&self, id: MessageId) -> AppResult<Option<Message>>;

    /// List messages in reverse-chronological storage order (newest
    /// first). Callers re-order to chronological for delivery.
    async fn list(
        &self,
        conversation_id: ConversationId,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Message>>;

    /// Add the user to the read-by set of every message in the
    /// conversation not already containing it. Returns the count
    /// updated. Idempotent.
    async fn mark_read(&self, conversation_id: ConversationId, user_id: UserId)
        -> AppResult<u64>;
}

/// Public profile lookup against the user service's store.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a user's public profile by id.
    async fn by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Look up a user's public profile by username.
    async fn by_username(&self, username: &str) -> AppResult<Option<User>>;
}
