//! # campushub-api
//!
//! HTTP and WebSocket surface: the `/ws` upgrade endpoint feeding the
//! realtime engine, the thin conversation/message REST routes, and the
//! `AppError` to HTTP response mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
