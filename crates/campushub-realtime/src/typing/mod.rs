//! Typing indicator broadcasting.

pub mod broadcaster;

pub use broadcaster::TypingBroadcaster;
