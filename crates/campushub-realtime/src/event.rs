//! Wire event types.
//!
//! Both directions are internally tagged JSON; the `type` field carries
//! the event name. Payload shape is the contract with the clients, so
//! field names here are stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campushub_core::types::{ConversationId, MessageId, SessionId, UserId};
use campushub_entity::message::Message;
use campushub_entity::presence::StatusChange;
use campushub_entity::user::User;

/// Events received from clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Authenticate the connection with a credential token.
    Connect { token: String },
    /// Join a conversation room.
    JoinConversation { conversation_id: ConversationId },
    /// Leave a conversation room.
    LeaveConversation { conversation_id: ConversationId },
    /// Send a message into a conversation.
    SendMessage {
        conversation_id: ConversationId,
        content: String,
    },
    /// The user started typing in a conversation.
    TypingStart { conversation_id: ConversationId },
    /// The user stopped typing in a conversation.
    TypingStop { conversation_id: ConversationId },
}

/// Events pushed to clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges a successful connect.
    ConnectionStatus {
        status: String,
        user_id: UserId,
        username: String,
        session_id: SessionId,
    },
    /// A failed operation. The connection stays open.
    Error { message: String },
    /// Acknowledges a room join.
    JoinedConversation { conversation_id: ConversationId },
    /// Acknowledges a room leave.
    LeftConversation { conversation_id: ConversationId },
    /// Acknowledges a successful send to the sender.
    MessageSent {
        message_id: MessageId,
        timestamp: DateTime<Utc>,
    },
    /// A new message, delivered to every connection in the conversation
    /// room, hydrated with the sender's display info.
    NewMessage { message: Message, sender: User },
    /// A new message, delivered to a participant's personal channel when
    /// they are online but do not have the conversation open.
    NewMessageNotification {
        message: Message,
        conversation_id: ConversationId,
        sender: User,
    },
    /// Typing indicator update, delivered to the room except the typist.
    UserTyping {
        user_id: UserId,
        conversation_id: ConversationId,
        typing: bool,
    },
    /// Online/offline transition, delivered to the user's contacts
    /// channel only.
    UserStatusChange {
        #[serde(flatten)]
        change: StatusChange,
    },
}

impl ServerEvent {
    /// Builds an error acknowledgment from any application error.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
