//! # campushub-realtime
//!
//! The realtime messaging core: presence and session tracking across
//! multiple concurrent connections per user, conversation-room
//! membership, message broadcast and notification fan-out, and
//! typing-indicator ephemeral state.
//!
//! The presence store (via `campushub-cache`) is the source of truth for
//! all transient state; in-process maps (connection pool, room registry)
//! only hold what cannot live anywhere else, namely the live transport
//! senders for this process.

pub mod connection;
pub mod event;
pub mod message;
pub mod presence;
pub mod room;
pub mod server;
pub mod session;
pub mod typing;

pub use connection::{ConnectionHandle, ConnectionPool};
pub use event::{ClientEvent, ServerEvent};
pub use presence::PresenceStore;
pub use room::RoomRegistry;
pub use server::RealtimeEngine;
