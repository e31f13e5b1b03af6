//! Realtime session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campushub_core::types::{ConnectionId, ConversationId, SessionId, UserId};

/// The tracked state of one authenticated live connection.
///
/// Created on successful authentication at connect time and destroyed on
/// disconnect or TTL expiry. The serialized mirror in the presence store
/// is the source of truth after a process restart; any in-memory copy is
/// a cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier.
    pub id: SessionId,
    /// The live transport connection this session is bound to.
    pub connection_id: ConnectionId,
    /// The authenticated user. Immutable for the session's lifetime.
    pub user_id: UserId,
    /// Username snapshot taken at connect time.
    pub username: String,
    /// Avatar reference snapshot taken at connect time.
    pub avatar_ref: Option<String>,
    /// Conversation rooms this session has joined.
    pub rooms: Vec<ConversationId>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp, refreshed on join/typing/send.
    pub last_activity: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a fresh session for a newly authenticated connection.
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        username: String,
        avatar_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            connection_id,
            user_id,
            username,
            avatar_ref,
            rooms: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Record that this session joined a conversation room.
    pub fn join_room(&mut self, conversation_id: ConversationId) {
        if !self.rooms.contains(&conversation_id) {
            self.rooms.push(conversation_id);
        }
        self.touch();
    }

    /// Record that this session left a conversation room.
    pub fn leave_room(&mut self, conversation_id: ConversationId) {
        self.rooms.retain(|r| *r != conversation_id);
        self.touch();
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether this session is currently joined to the given room.
    pub fn is_in_room(&self, conversation_id: ConversationId) -> bool {
        self.rooms.contains(&conversation_id)
    }
}
