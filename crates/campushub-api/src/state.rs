//! Application state shared across all handlers.

use std::sync::Arc;

use campushub_auth::JwtDecoder;
use campushub_cache::provider::CacheManager;
use campushub_core::config::AppConfig;
use campushub_database::DatabasePool;
use campushub_database::store::{ConversationStore, MessageStore, UserDirectory};
use campushub_realtime::RealtimeEngine;

/// Shared dependencies, passed to every handler via `State<AppState>`.
///
/// Store fields are trait objects so tests and local development run the
/// whole surface against in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Presence store backend (Redis or in-memory).
    pub cache: Arc<CacheManager>,
    /// PostgreSQL pool, absent when running on in-memory stores.
    pub db: Option<DatabasePool>,
    /// JWT verification.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// The realtime core.
    pub engine: Arc<RealtimeEngine>,
    /// Conversation lookup and creation.
    pub conversations: Arc<dyn ConversationStore>,
    /// Message persistence.
    pub messages: Arc<dyn MessageStore>,
    /// Public profile lookup.
    pub users: Arc<dyn UserDirectory>,
}
