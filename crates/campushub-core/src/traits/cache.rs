//! Cache provider trait for pluggable presence store backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for presence store backends (Redis or in-memory).
///
/// All values are serialized as strings (JSON). Every operation is a
/// single-key or single-set operation assumed atomic at the store level;
/// no multi-key transactions are required by callers.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Set a value only if the key does not already exist (NX).
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Set or refresh the TTL on an existing key. Returns `false` if the
    /// key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Add a member to a set, refreshing the set's TTL. Adding an existing
    /// member is a no-op. Returns `true` if the member was newly added.
    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<bool>;

    /// Remove a member from a set. Returns `true` if the member was present.
    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool>;

    /// Return all members of a set. An absent or expired key yields an
    /// empty list.
    async fn set_members(&self, key: &str) -> AppResult<Vec<String>>;

    /// Return the cardinality of a set.
    async fn set_len(&self, key: &str) -> AppResult<u64>;

    /// Return all keys matching a glob pattern (e.g. `"typing:abc:*"`).
    /// Best-effort: used only for scans where eventual consistency is
    /// acceptable.
    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>>;

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
