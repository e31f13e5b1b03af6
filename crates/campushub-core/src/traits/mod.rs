//! Trait definitions shared across CampusHub crates.

pub mod cache;

pub use cache::CacheProvider;
