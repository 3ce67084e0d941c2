use anyhow::Result;
use bytes::Bytes;
use deadpool_redis::{redis, Config, Pool, Runtime};
use std::time::Duration;
use tracing::info;

use super::store::CacheStore;

/// Redis-backed store. A pooled connection is acquired per call and returned
/// to the pool when it drops.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub fn new(url: &str) -> Result<Self> {
        let pool = Config::from_url(url).create_pool(Some(Runtime::Tokio1))?;
        info!("Redis cache pool created for {}", redis_host(url));
        Ok(Self { pool })
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}

/// `host:port/db` part of a Redis URL, without scheme or credentials
fn redis_host(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    rest.rsplit_once('@').map_or(rest, |(_, host)| host)
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let () = redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.scan_prefix(prefix).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get().await?;
        let removed: i64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
        Ok(removed.max(0) as usize)
    }

    async fn count_prefix(&self, prefix: &str) -> Result<usize> {
        Ok(self.scan_prefix(prefix).await?.len())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_host_strips_credentials() {
        assert_eq!(redis_host("redis://:s3cret@cache.internal:6379/0"), "cache.internal:6379/0");
        assert_eq!(redis_host("rediss://app:pw@10.0.0.5:6380"), "10.0.0.5:6380");
        assert_eq!(redis_host("redis://localhost:6379"), "localhost:6379");
        assert_eq!(redis_host("localhost:6379"), "localhost:6379");
    }
}
