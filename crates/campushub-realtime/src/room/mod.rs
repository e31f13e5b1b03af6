//! Transport broadcast rooms.

pub mod names;
pub mod registry;

pub use registry::RoomRegistry;
