//! In-memory store implementation with per-key expiry.
//!
//! Unlike a cache-level TTL, presence semantics need per-key TTLs (a
//! typing flag and a session record live in the same store with very
//! different lifetimes), so entries carry their own deadline and expiry
//! is checked on every access.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use campushub_core::config::MemoryCacheConfig;
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::traits::cache::CacheProvider;

/// A stored entry: either a plain value or a set, each with a deadline.
#[derive(Debug, Clone)]
enum Entry {
    Value {
        value: String,
        expires_at: Instant,
    },
    Set {
        members: HashSet<String>,
        expires_at: Instant,
    },
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        let deadline = match self {
            Entry::Value { expires_at, .. } => *expires_at,
            Entry::Set { expires_at, .. } => *expires_at,
        };
        deadline <= now
    }
}

/// In-memory presence store provider.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    entries: std::sync::Arc<DashMap<String, Entry>>,
    max_capacity: u64,
}

impl MemoryCacheProvider {
    /// Create a new in-memory store from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self {
            entries: std::sync::Arc::new(DashMap::new()),
            max_capacity: config.max_capacity,
        }
    }

    /// Remove an entry if it has expired; returns the live entry otherwise.
    fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(now) {
                drop(entry);
                self.entries.remove(key);
                return None;
            }
            return Some(entry.clone());
        }
        None
    }

    /// Drop all expired entries. Runs eagerly when the store grows past
    /// its configured capacity.
    fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn maybe_evict(&self) {
        if self.entries.len() as u64 > self.max_capacity {
            self.evict_expired();
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match self.live_entry(key) {
            Some(Entry::Value { value, .. }) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.maybe_evict();
        self.entries.insert(
            key.to_string(),
            Entry::Value {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live_entry(key).is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        let mut inserted = false;
        let entry = self
            .entries
            .entry(key.to_string())
            .and_modify(|existing| {
                if existing.is_expired(now) {
                    *existing = Entry::Value {
                        value: value.to_string(),
                        expires_at: now + ttl,
                    };
                    inserted = true;
                }
            })
            .or_insert_with(|| {
                inserted = true;
                Entry::Value {
                    value: value.to_string(),
                    expires_at: now + ttl,
                }
            });
        drop(entry);
        Ok(inserted)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                match entry.value_mut() {
                    Entry::Value { expires_at, .. } => *expires_at = now + ttl,
                    Entry::Set { expires_at, .. } => *expires_at = now + ttl,
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<bool> {
        self.maybe_evict();
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set {
                members: HashSet::new(),
                expires_at: now + ttl,
            });
        if entry.is_expired(now) {
            *entry = Entry::Set {
                members: HashSet::new(),
                expires_at: now + ttl,
            };
        }
        let added = match entry.value_mut() {
            Entry::Set {
                members,
                expires_at,
            } => {
                let added = members.insert(member.to_string());
                *expires_at = now + ttl;
                added
            }
            Entry::Value { .. } => {
                return Err(AppError::internal(format!(
                    "Key '{key}' holds a plain value, not a set"
                )));
            }
        };
        Ok(added)
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool> {
        let now = Instant::now();
        let mut removed = false;
        let mut emptied = false;
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired(now) {
                drop(entry);
                self.entries.remove(key);
                return Ok(false);
            }
            if let Entry::Set { members, .. } = entry.value_mut() {
                removed = members.remove(member);
                emptied = members.is_empty();
            }
        }
        if emptied {
            self.entries.remove(key);
        }
        Ok(removed)
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        match self.live_entry(key) {
            Some(Entry::Set { members, .. }) => {
                let mut out: Vec<String> = members.into_iter().collect();
                out.sort();
                Ok(out)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn set_len(&self, key: &str) -> AppResult<u64> {
        match self.live_entry(key) {
            Some(Entry::Set { members, .. }) => Ok(members.len() as u64),
            _ => Ok(0),
        }
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        // Pattern scans here only ever use trailing-star globs.
        let prefix = pattern.trim_end_matches('*');
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            max_capacity: 1000,
        })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_value_expires() {
        let provider = make_provider();
        provider
            .set("short", "v", Duration::from_millis(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.get("short").await.unwrap(), None);
        assert!(!provider.exists("short").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_add_is_idempotent() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        assert!(provider.set_add("s", "a", ttl).await.unwrap());
        assert!(!provider.set_add("s", "a", ttl).await.unwrap());
        assert_eq!(provider.set_len("s").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_remove_drops_empty_set() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.set_add("s", "a", ttl).await.unwrap();
        assert!(provider.set_remove("s", "a").await.unwrap());
        assert!(!provider.exists("s").await.unwrap());
        assert!(!provider.set_remove("s", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_members_sorted() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.set_add("s", "b", ttl).await.unwrap();
        provider.set_add("s", "a", ttl).await.unwrap();
        assert_eq!(
            provider.set_members("s").await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_expires_as_a_whole() {
        let provider = make_provider();
        provider
            .set_add("s", "a", Duration::from_millis(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(provider.set_members("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_nx() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        assert!(provider.set_nx("nx", "v1", ttl).await.unwrap());
        assert!(!provider.set_nx("nx", "v2", ttl).await.unwrap());
        assert_eq!(provider.get("nx").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_scan_keys_prefix() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.set("typing:c1:u1", "1", ttl).await.unwrap();
        provider.set("typing:c1:u2", "1", ttl).await.unwrap();
        provider.set("typing:c2:u3", "1", ttl).await.unwrap();
        let keys = provider.scan_keys("typing:c1:*").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("typing:c1:")));
    }

    #[tokio::test]
    async fn test_expire_refreshes_deadline() {
        let provider = make_provider();
        provider
            .set("k", "v", Duration::from_millis(40))
            .await
            .unwrap();
        assert!(provider.expire("k", Duration::from_secs(60)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.get("k").await.unwrap(), Some("v".to_string()));
        assert!(!provider.expire("missing", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let provider = make_provider();
        let data = serde_json::json!({"name": "test", "count": 42});
        provider
            .set_json("json_key", &data, Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<serde_json::Value> = provider.get_json("json_key").await.unwrap();
        assert_eq!(result, Some(data));
    }
}
