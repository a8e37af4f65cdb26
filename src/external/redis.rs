//! Cache client over Redis with a process-local in-memory fallback.
//!
//! Every operation first tries Redis (when configured) and silently falls
//! back to the in-memory store when the server is unreachable, so cache
//! reads never take the application down. Last write wins; entries expire
//! by TTL only.

use crate::error::AppResult;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Clone, Default)]
struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let expired = entries
            .get(key)
            .is_some_and(|e| e.expires_at.is_some_and(|at| Instant::now() >= at));
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
    }

    async fn del(&self, key: &str) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    async fn incr(&self, key: &str) -> i64 {
        let mut entries = self.entries.lock().await;
        let expired = entries
            .get(key)
            .is_some_and(|e| e.expires_at.is_some_and(|at| Instant::now() >= at));
        if expired {
            entries.remove(key);
        }

        let (current, expires_at) = entries
            .get(key)
            .map(|e| (e.value.parse::<i64>().unwrap_or(0), e.expires_at))
            .unwrap_or((0, None));
        let next = current + 1;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: next.to_string(),
                expires_at,
            },
        );
        next
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
                true
            }
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct CacheClient {
    redis: Option<redis::Client>,
    memory: MemoryStore,
}

impl CacheClient {
    /// Build a client for the configured URL; without a URL everything
    /// lives in the in-memory store.
    pub fn connect(url: Option<&str>) -> AppResult<Self> {
        let redis = match url {
            Some(url) => Some(redis::Client::open(url)?),
            None => {
                log::warn!("REDIS_URL not set, cache using in-memory store");
                None
            }
        };

        Ok(Self {
            redis,
            memory: MemoryStore::default(),
        })
    }

    /// In-memory only client.
    pub fn memory() -> Self {
        Self {
            redis: None,
            memory: MemoryStore::default(),
        }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if let Some(client) = &self.redis {
            match self.redis_get(client, key).await {
                Ok(value) => return Ok(value),
                Err(e) => log::debug!("Redis GET failed, falling back to memory: {e}"),
            }
        }
        Ok(self.memory.get(key).await)
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        if let Some(client) = &self.redis {
            match self.redis_set_ex(client, key, value, ttl_secs).await {
                Ok(()) => return Ok(()),
                Err(e) => log::debug!("Redis SETEX failed, falling back to memory: {e}"),
            }
        }
        self.memory.set_ex(key, value, ttl_secs).await;
        Ok(())
    }

    pub async fn del(&self, key: &str) -> AppResult<bool> {
        if let Some(client) = &self.redis {
            match self.redis_del(client, key).await {
                Ok(removed) => return Ok(removed),
                Err(e) => log::debug!("Redis DEL failed, falling back to memory: {e}"),
            }
        }
        Ok(self.memory.del(key).await)
    }

    pub async fn incr(&self, key: &str) -> AppResult<i64> {
        if let Some(client) = &self.redis {
            match self.redis_incr(client, key).await {
                Ok(n) => return Ok(n),
                Err(e) => log::debug!("Redis INCR failed, falling back to memory: {e}"),
            }
        }
        Ok(self.memory.incr(key).await)
    }

    pub async fn expire(&self, key: &str, ttl_secs: u64) -> AppResult<bool> {
        if let Some(client) = &self.redis {
            match self.redis_expire(client, key, ttl_secs).await {
                Ok(set) => return Ok(set),
                Err(e) => log::debug!("Redis EXPIRE failed, falling back to memory: {e}"),
            }
        }
        Ok(self.memory.expire(key, ttl_secs).await)
    }

    /// Fixed-window rate limiter: at most `limit` hits per `window_secs`
    /// per key. Returns whether this hit is allowed.
    pub async fn rate_limit(&self, key: &str, limit: i64, window_secs: u64) -> AppResult<bool> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let window = now_ms / (window_secs as u128 * 1000);
        let window_key = format!("ratelimit:{key}:{window}");

        let count = self.incr(&window_key).await?;
        if count == 1 {
            self.expire(&window_key, window_secs).await?;
        }
        Ok(count <= limit)
    }

    async fn redis_get(&self, client: &redis::Client, key: &str) -> redis::RedisResult<Option<String>> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    async fn redis_set_ex(
        &self,
        client: &redis::Client,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> redis::RedisResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.set_ex(key, value, ttl_secs).await
    }

    async fn redis_del(&self, client: &redis::Client, key: &str) -> redis::RedisResult<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn redis_incr(&self, client: &redis::Client, key: &str) -> redis::RedisResult<i64> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.incr(key, 1).await
    }

    async fn redis_expire(
        &self,
        client: &redis::Client,
        key: &str,
        ttl_secs: u64,
    ) -> redis::RedisResult<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.expire(key, ttl_secs as i64).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let cache = CacheClient::memory();
        cache.set_ex("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        assert!(cache.del("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.del("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        let cache = CacheClient::memory();
        cache.set_ex("k", "v", 60).await.unwrap();
        // a zero TTL expires the entry immediately
        assert!(cache.expire("k", 0).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_counts_up() {
        let cache = CacheClient::memory();
        assert_eq!(cache.incr("n").await.unwrap(), 1);
        assert_eq!(cache.incr("n").await.unwrap(), 2);
        assert_eq!(cache.incr("n").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_window() {
        let cache = CacheClient::memory();
        for _ in 0..5 {
            assert!(cache.rate_limit("login", 5, 60).await.unwrap());
        }
        assert!(!cache.rate_limit("login", 5, 60).await.unwrap());
    }
}
