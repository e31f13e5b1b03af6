//! Route definitions.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::list_messages)
                .post(handlers::conversation::send_message),
        )
        .route(
            "/conversations/{id}/read",
            post(handlers::conversation::mark_read),
        );

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
