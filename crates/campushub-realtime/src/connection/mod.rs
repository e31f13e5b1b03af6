//! Live connection tracking for this process.

pub mod handle;
pub mod pool;

pub use handle::{ConnectionHandle, SessionIdentity};
pub use pool::ConnectionPool;
