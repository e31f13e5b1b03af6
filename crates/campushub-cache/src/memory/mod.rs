//! In-memory presence store provider.

mod store;

pub use store::MemoryCacheProvider;
