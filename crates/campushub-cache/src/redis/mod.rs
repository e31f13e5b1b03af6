//! Redis presence store provider.

mod client;
mod operations;

pub use client::RedisClient;
pub use operations::RedisCacheProvider;
