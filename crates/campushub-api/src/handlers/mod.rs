//! Route handlers.

pub mod conversation;
pub mod health;
pub mod ws;
