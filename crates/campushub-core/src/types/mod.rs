//! Shared type definitions.

pub mod id;

pub use id::{ConnectionId, ConversationId, MessageId, SessionId, UserId};
