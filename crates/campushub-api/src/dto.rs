//! Request and response bodies for the REST routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use campushub_core::types::{ConversationId, MessageId, UserId};
use campushub_entity::conversation::Conversation;
use campushub_entity::message::Message;

/// POST /api/conversations
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationRequest {
    /// The other participant.
    pub peer_id: UserId,
}

/// POST /api/conversations/{id}/messages
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Message text. Trimmed server-side; must not be blank.
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Query for GET /api/conversations/{id}/messages
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Zero-based page index.
    #[serde(default)]
    pub page: u64,
    /// Page size, capped at 100.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

impl MessagesQuery {
    /// Effective page size.
    pub fn capped_limit(&self) -> u32 {
        self.limit.clamp(1, 100)
    }
}

/// A conversation as returned by the REST routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: ConversationId,
    pub participant_a: UserId,
    pub participant_b: UserId,
    pub created_at: DateTime<Utc>,
    pub last_message_id: Option<MessageId>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            participant_a: c.participant_a,
            participant_b: c.participant_b,
            created_at: c.created_at,
            last_message_id: c.last_message_id,
            last_message_at: c.last_message_at,
        }
    }
}

/// A page of messages in chronological order.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub page: u64,
    pub limit: u32,
}

/// POST /api/conversations/{id}/read
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// How many messages were newly marked.
    pub updated: u64,
}

/// GET /health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache: bool,
    pub database: Option<bool>,
}
