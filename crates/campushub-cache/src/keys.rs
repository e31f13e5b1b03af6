//! Presence store key builders for all CampusHub ephemeral state.
//!
//! Centralising key construction prevents typos and makes it easy to
//! find every key the application uses. The typing-key format is a fixed
//! convention: the user id embedded in the key must be recoverable, since
//! typing lookups scan by conversation and parse the user back out.

use campushub_core::types::{ConversationId, MessageId, SessionId, UserId};

/// Key for a serialized session record.
pub fn session(session_id: SessionId) -> String {
    format!("session:{session_id}")
}

/// Key for the set of a user's active session ids.
pub fn user_sessions(user_id: UserId) -> String {
    format!("presence:sessions:{user_id}")
}

/// Key for a user's online flag. Presence of the key means online.
pub fn user_online(user_id: UserId) -> String {
    format!("presence:online:{user_id}")
}

/// Pattern matching every online flag, used by the reconciliation sweep.
pub fn user_online_pattern() -> &'static str {
    "presence:online:*"
}

/// Extract the user id from an online-flag key produced by [`user_online`].
pub fn parse_user_online(key: &str) -> Option<UserId> {
    key.strip_prefix("presence:online:")?.parse().ok()
}

/// Key for the set of user ids currently present in a conversation room.
pub fn room_users(conversation_id: ConversationId) -> String {
    format!("room:users:{conversation_id}")
}

/// Key for the set of session ids currently joined to a conversation room.
pub fn room_sessions(conversation_id: ConversationId) -> String {
    format!("room:sessions:{conversation_id}")
}

/// Key for a typing indicator flag. Presence of the key means "currently
/// typing"; absence (including TTL expiry) means not typing.
pub fn typing(conversation_id: ConversationId, user_id: UserId) -> String {
    format!("typing:{conversation_id}:{user_id}")
}

/// Pattern matching all typing flags for a conversation.
pub fn typing_pattern(conversation_id: ConversationId) -> String {
    format!("typing:{conversation_id}:*")
}

/// Extract the user id from a typing key produced by [`typing`].
pub fn parse_typing_user(key: &str) -> Option<UserId> {
    key.rsplit(':').next()?.parse().ok()
}

/// Key for a cached message by id (read-through cache, not authoritative).
pub fn message(message_id: MessageId) -> String {
    format!("msg:{message_id}")
}
