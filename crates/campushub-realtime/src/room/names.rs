//! Deterministic room name derivation.

use campushub_core::types::{ConversationId, UserId};

/// Room shared by every connection currently viewing a conversation.
pub fn conversation_room(conversation_id: ConversationId) -> String {
    format!("conversation_{conversation_id}")
}

/// A user's personal notification channel. Every authenticated
/// connection of the user joins it.
pub fn user_room(user_id: UserId) -> String {
    format!("user_{user_id}")
}

/// The channel a user's contacts subscribe to for status changes.
pub fn contacts_room(user_id: UserId) -> String {
    format!("contacts_{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_room_names_are_deterministic() {
        let user = UserId::from_uuid(Uuid::nil());
        assert_eq!(
            user_room(user),
            "user_00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            contacts_room(user),
            "contacts_00000000-0000-0000-0000-000000000000"
        );
    }
}
