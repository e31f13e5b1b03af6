//! # campushub-cache
//!
//! Presence store providers for CampusHub. Supports two modes:
//!
//! - **memory**: In-process store with per-key expiry (tests, single-node dev)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. Presence
//! state must be usable from any process instance, so production
//! deployments use Redis; the in-memory provider exists for tests and
//! local development only.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
