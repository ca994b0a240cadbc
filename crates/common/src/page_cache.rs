//! Rendered page cache.
//!
//! Stores immutable page snapshots under a key for a fixed time window.
//! Writes to the underlying data never invalidate an entry; only expiry or an
//! explicit [`PageCache::clear`] does. Two backends are provided:
//!
//! - [`MemoryPageCache`]: process-local, used by default and in tests
//! - [`RedisPageCache`]: shared between server processes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{AppError, AppResult};

/// Most entries the in-memory cache holds at once.
const MAX_ENTRIES: usize = 1000;

/// A key → snapshot cache with per-entry TTL and a manual clear.
#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    /// Get a cached snapshot, if present and not expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a snapshot for `ttl`. Overwrites any previous entry.
    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()>;

    /// Drop every cached snapshot.
    async fn clear(&self) -> AppResult<()>;
}

/// Page cache shared between handlers.
pub type SharedPageCache = Arc<dyn PageCache>;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

/// In-process page cache.
#[derive(Clone, Default)]
pub struct MemoryPageCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryPageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(key = %key, "Page cache hit");
                Ok(Some(entry.body.clone()))
            }
            _ => {
                debug!(key = %key, "Page cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                expires_at: now + ttl,
            },
        );

        if entries.len() > MAX_ENTRIES {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        while entries.len() > MAX_ENTRIES {
            let oldest = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(oldest) => {
                    debug!(key = %oldest, "Evicting page cache entry");
                    entries.remove(&oldest);
                }
                None => break,
            }
        }
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        info!("Cleared in-memory page cache");
        Ok(())
    }
}

/// Redis-backed page cache.
///
/// Keys are namespaced by a generation counter, so clearing is a single
/// `INCR`; entries of older generations simply expire.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisPageCache {
    /// Create a Redis page cache using `prefix` for all keys.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn generation_key(&self) -> String {
        format!("{}:page_cache:generation", self.prefix)
    }

    fn entry_key(&self, generation: i64, key: &str) -> String {
        format!("{}:page_cache:{generation}:{key}", self.prefix)
    }

    async fn generation(&self) -> AppResult<i64> {
        let generation: Option<i64> = self
            .redis
            .get(self.generation_key())
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(generation.unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let generation = self.generation().await?;
        let body: Option<String> = self
            .redis
            .get(self.entry_key(generation, key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        debug!(key = %key, hit = body.is_some(), "Page cache lookup");
        Ok(body)
    }

    async fn set(&self, key: &str, body: String, ttl: Duration) -> AppResult<()> {
        let generation = self.generation().await?;
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        self.redis
            .set::<(), _, _>(
                self.entry_key(generation, key),
                body,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn clear(&self) -> AppResult<()> {
        let generation: i64 = self
            .redis
            .incr(self.generation_key())
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        info!(generation = generation, "Cleared Redis page cache");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_set() {
        let cache = MemoryPageCache::new();
        assert!(cache.get("index:1").await.unwrap().is_none());

        cache
            .set("index:1", "A".to_string(), Duration::from_secs(20))
            .await
            .unwrap();

        assert_eq!(cache.get("index:1").await.unwrap().as_deref(), Some("A"));
        assert!(cache.get("index:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_overwrite_last_writer_wins() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        cache.set("index:1", "A".to_string(), ttl).await.unwrap();
        cache.set("index:1", "B".to_string(), ttl).await.unwrap();

        assert_eq!(cache.get("index:1").await.unwrap().as_deref(), Some("B"));
        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_entry_expires() {
        let cache = MemoryPageCache::new();
        cache
            .set("index:1", "A".to_string(), Duration::from_secs(20))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(19)).await;
        assert!(cache.get("index:1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("index:1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_entry_count_is_bounded() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        for n in 0..MAX_ENTRIES + 50 {
            cache.set(&format!("index:{n}"), n.to_string(), ttl).await.unwrap();
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        assert_eq!(cache.entries.read().await.len(), MAX_ENTRIES);
        assert!(cache.get("index:0").await.unwrap().is_none());
        let last = format!("index:{}", MAX_ENTRIES + 49);
        assert!(cache.get(&last).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_clear() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        cache.set("index:1", "A".to_string(), ttl).await.unwrap();
        cache.set("index:2", "B".to_string(), ttl).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.entries.read().await.is_empty());
        assert!(cache.get("index:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redis_key_layout() {
        let config = fred::types::config::Config::default();
        let client = fred::clients::Client::new(config, None, None, None);
        let cache = RedisPageCache::new(Arc::new(client), "yatube");

        assert_eq!(cache.generation_key(), "yatube:page_cache:generation");
        assert_eq!(cache.entry_key(3, "index:1"), "yatube:page_cache:3:index:1");
    }
}
