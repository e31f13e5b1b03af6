//! Conversation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use campushub_core::types::{ConversationId, MessageId, UserId};

/// A durable direct conversation between exactly two users.
///
/// The participant pair is canonicalized (sorted) so that "the
/// conversation between A and B" is uniquely addressable regardless of
/// which side initiates it, making creation idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The lower participant of the canonical pair.
    pub participant_a: UserId,
    /// The higher participant of the canonical pair.
    pub participant_b: UserId,
    /// When the conversation was created (first contact).
    pub created_at: DateTime<Utc>,
    /// Pointer to the most recent message, if any.
    pub last_message_id: Option<MessageId>,
    /// Timestamp of the most recent message, if any.
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Whether the given user is a participant.
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is a participant.
    pub fn other_participant(&self, user_id: UserId) -> Option<UserId> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }

    /// Both participants as a slice-friendly array.
    pub fn participants(&self) -> [UserId; 2] {
        [self.participant_a, self.participant_b]
    }
}

/// Canonicalize an unordered participant pair into (lower, higher).
///
/// Every write path that addresses a conversation by its participants must
/// go through this function so the same pair always maps to the same row.
pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}
