//! # campushub-entity
//!
//! Domain entity models for CampusHub: users, realtime sessions,
//! conversations, messages, and presence state.

pub mod conversation;
pub mod message;
pub mod presence;
pub mod session;
pub mod user;

pub use conversation::Conversation;
pub use message::Message;
pub use presence::{StatusChange, UserStatus};
pub use session::SessionRecord;
pub use user::User;
