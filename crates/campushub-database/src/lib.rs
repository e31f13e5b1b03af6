//! # campushub-database
//!
//! Durable store client for CampusHub. Provides the PostgreSQL connection
//! pool, migrations, the store traits consumed by the realtime engine,
//! sqlx repository implementations, and in-memory implementations used by
//! tests and local development.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{ConversationStore, MessageStore, UserDirectory};
