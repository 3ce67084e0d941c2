use anyhow::Result;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared key-value store. Every operation is atomic per key.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Returns the number of keys removed
    async fn delete_prefix(&self, prefix: &str) -> Result<usize>;
    async fn count_prefix(&self, prefix: &str) -> Result<usize>;
    async fn ping(&self) -> Result<()>;
}

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process store with lazy expiry. Expired entries are also dropped by
/// [`MemoryCacheStore::cleanup_expired`].
#[derive(Default)]
pub struct MemoryCacheStore {
    map: DashMap<String, Entry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        info!("Initializing in-memory cache store");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns number of entries removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let start_len = self.map.len();
        self.map.retain(|_, e| !e.is_expired(now));
        let count = start_len.saturating_sub(self.map.len());

        if count > 0 {
            info!("Cleaned up {} expired cache entries", count);
        }

        count
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let now = Instant::now();
        let Some(entry) = self.map.get(key) else {
            return Ok(None);
        };

        if entry.is_expired(now) {
            drop(entry); // release shard lock before removing
            self.map.remove_if(key, |_, e| e.is_expired(now));
            debug!("Cache key {} expired", key);
            return Ok(None);
        }

        Ok(Some(entry.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let start_len = self.map.len();
        self.map.retain(|k, _| !k.starts_with(prefix));
        Ok(start_len.saturating_sub(self.map.len()))
    }

    async fn count_prefix(&self, prefix: &str) -> Result<usize> {
        let now = Instant::now();
        Ok(self
            .map
            .iter()
            .filter(|r| r.key().starts_with(prefix) && !r.is_expired(now))
            .count())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
