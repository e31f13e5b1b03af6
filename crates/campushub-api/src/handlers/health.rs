//! Health endpoint.

use axum::Json;
use axum::extract::State;

use campushub_core::traits::cache::CacheProvider;

use crate::dto::HealthResponse;
use crate::state::AppState;

/// GET /health
///
/// Reports reachability of the presence store and, when configured, the
/// durable store. Always answers 200; orchestration reads the body.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.cache.health_check().await.unwrap_or(false);
    let database = match &state.db {
        Some(pool) => Some(pool.health_check().await.unwrap_or(false)),
        None => None,
    };
    let status = if cache && database.unwrap_or(true) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        cache,
        database,
    })
}
