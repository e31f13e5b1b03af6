//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use campushub_core::types::{ConversationId, MessageId, UserId};

/// A durable message within a conversation.
///
/// All stored timestamps are UTC instants; conversion to local time
/// happens only at the presentation boundary. Immutable once created
/// except for the read-by set (which only grows) and content edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// The sending user.
    pub sender_id: UserId,
    /// Text content.
    pub content: String,
    /// Attachment reference in object storage, if any.
    pub attachment_ref: Option<String>,
    /// Users who have read this message. Initially just the sender;
    /// grows monotonically.
    pub read_by: Vec<UserId>,
    /// UTC creation instant. Defines the ordering contract within a
    /// conversation.
    pub created_at: DateTime<Utc>,
    /// Set when the content was edited.
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether the given user has read this message.
    pub fn is_read_by(&self, user_id: UserId) -> bool {
        self.read_by.contains(&user_id)
    }
}

/// Input for inserting a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// The sender.
    pub sender_id: UserId,
    /// Text content (already validated non-empty).
    pub content: String,
    /// Optional attachment reference.
    pub attachment_ref: Option<String>,
}
