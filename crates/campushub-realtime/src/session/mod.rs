//! Connection session lifecycle.

pub mod manager;

pub use manager::SessionManager;
