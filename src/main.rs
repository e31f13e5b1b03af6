//! CampusHub realtime messaging server.
//!
//! Wires the crates together: configuration, logging, durable store,
//! presence store, the realtime engine, and the HTTP/WebSocket surface.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use campushub_api::AppState;
use campushub_auth::JwtDecoder;
use campushub_cache::provider::CacheManager;
use campushub_core::config::AppConfig;
use campushub_core::error::AppError;
use campushub_database::DatabasePool;
use campushub_database::repositories::{
    ConversationRepository, MessageRepository, UserRepository,
};
use campushub_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("CAMPUSHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing output per the logging config.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CampusHub v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    campushub_database::migration::run_migrations(db.pool()).await?;

    tracing::info!(provider = %config.cache.provider, "Initializing presence store");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    let conversations = Arc::new(ConversationRepository::new(db.pool().clone()));
    let messages = Arc::new(MessageRepository::new(db.pool().clone()));
    let users = Arc::new(UserRepository::new(db.pool().clone()));
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

    let engine = Arc::new(RealtimeEngine::new(
        cache.clone(),
        config.presence.clone(),
        config.realtime.clone(),
        JwtDecoder::new(&config.auth),
        users.clone(),
        conversations.clone(),
        messages.clone(),
    ));
    let sweeper = engine.spawn_sweeper();

    let state = AppState {
        config: Arc::new(config.clone()),
        cache,
        db: Some(db.clone()),
        jwt_decoder,
        engine: engine.clone(),
        conversations,
        messages,
        users,
    };
    let router = campushub_api::build_router(state);

    let addr = config.server.bind_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            campushub_core::error::ErrorKind::Configuration,
            format!("Failed to bind {addr}"),
            e,
        )
    })?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    engine.shutdown();
    sweeper.abort();
    db.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
