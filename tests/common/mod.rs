//! Shared helpers for the integration suite.
//!
//! Runs the full router against in-memory stores, so no PostgreSQL or
//! Redis instance is needed.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use campushub_api::AppState;
use campushub_auth::{JwtDecoder, JwtEncoder};
use campushub_cache::memory::MemoryCacheProvider;
use campushub_cache::provider::CacheManager;
use campushub_core::config::{AppConfig, DatabaseConfig};
use campushub_core::types::UserId;
use campushub_database::memory::{
    MemoryConversationStore, MemoryMessageStore, MemoryUserDirectory,
};
use campushub_entity::user::User;
use campushub_realtime::RealtimeEngine;

/// An application instance wired onto in-memory backends.
pub struct TestApp {
    pub router: Router,
    users: Arc<MemoryUserDirectory>,
    encoder: JwtEncoder,
}

impl TestApp {
    pub fn new() -> Self {
        let config = base_config();
        let encoder = JwtEncoder::new(&config.auth);

        let users = Arc::new(MemoryUserDirectory::new());
        let conversations = Arc::new(MemoryConversationStore::new());
        let messages = Arc::new(MemoryMessageStore::new(conversations.clone()));

        let provider = MemoryCacheProvider::new(&config.cache.memory);
        let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));

        let engine = Arc::new(RealtimeEngine::new(
            cache.clone(),
            config.presence.clone(),
            config.realtime.clone(),
            JwtDecoder::new(&config.auth),
            users.clone(),
            conversations.clone(),
            messages.clone(),
        ));

        let state = AppState {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            cache,
            db: None,
            engine,
            conversations: conversations.clone(),
            messages: messages.clone(),
            users: users.clone(),
        };

        Self {
            router: campushub_api::build_router(state),
            users,
            encoder,
        }
    }

    /// Registers a user in the directory and returns it.
    pub fn register_user(&self, username: &str) -> User {
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            avatar_ref: None,
        };
        self.users.add(user.clone());
        user
    }

    /// Signs an access token for the user.
    pub fn token_for(&self, user: &User) -> String {
        self.encoder
            .encode(user.id, &user.username, None, 3600)
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request with no Authorization header.
    pub async fn get_anonymous(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn base_config() -> AppConfig {
    let mut config = AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 60,
        },
        cache: Default::default(),
        auth: Default::default(),
        presence: Default::default(),
        realtime: Default::default(),
        logging: Default::default(),
    };
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}
