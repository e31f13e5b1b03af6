//! Presence and session state over the shared low-latency store.

pub mod store;
pub mod sweeper;

pub use store::PresenceStore;
pub use sweeper::PresenceSweeper;
