//! Blog cache layer
//!
//! Provides the cache adapter used in front of the durable store:
//! - `CacheStore`: object-safe byte-level get/set/del with optional TTL
//! - `RedisCacheStore` / `InMemoryCacheStore`: production and test backends
//! - `BlogCache`: typed JSON access with corrupt-entry eviction and TTL jitter
//! - `CacheKey`: unified, versioned key schema
//!
//! Cache entries are derived data. Callers decide how to react to a
//! `CacheError`; the content store treats every cache fault as a miss.

mod error;
mod keys;
pub mod memory;
pub mod redis_store;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Byte-level cache adapter
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a raw value, `None` when absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a raw value; `ttl = None` stores without expiry
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key (deleting an absent key is not an error)
    async fn del(&self, key: &str) -> CacheResult<()>;
}

/// Typed cache client over any `CacheStore`
#[derive(Clone)]
pub struct BlogCache {
    store: Arc<dyn CacheStore>,
}

impl BlogCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Add jitter to TTL to prevent thundering herd
    fn add_jitter(ttl: Duration) -> Duration {
        let jitter_percent = (rand::random::<u32>() % 10) as f64 / 100.0;
        let jitter = (ttl.as_secs() as f64 * jitter_percent).round() as u64;
        ttl + Duration::from_secs(jitter)
    }

    /// Get and deserialize a value
    ///
    /// A payload that no longer deserializes (schema drift, truncation) is
    /// deleted and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let Some(data) = self.store.get(key).await? else {
            debug!(key = %key, "Cache miss");
            return Ok(None);
        };

        match serde_json::from_slice::<T>(&data) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache deserialization failed");
                if let Err(del_err) = self.store.del(key).await {
                    warn!(key = %key, error = %del_err, "Failed to evict corrupted cache entry");
                }
                Ok(None)
            }
        }
    }

    /// Serialize and store a value; `ttl = None` means no forced expiry
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let data = serde_json::to_vec(value)?;
        let ttl = ttl.map(Self::add_jitter);

        self.store.set(key, data, ttl).await?;
        debug!(key = %key, ttl_secs = ?ttl.map(|t| t.as_secs()), "Cache set");
        Ok(())
    }

    pub async fn del(&self, key: &str) -> CacheResult<()> {
        self.store.del(key).await?;
        debug!(key = %key, "Cache delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        title: String,
    }

    fn cache() -> (BlogCache, Arc<InMemoryCacheStore>) {
        let store = Arc::new(InMemoryCacheStore::new());
        (BlogCache::new(store.clone()), store)
    }

    #[test]
    fn test_add_jitter() {
        let ttl = Duration::from_secs(300);
        let with_jitter = BlogCache::add_jitter(ttl);
        // Jitter should be 0-10% of TTL
        assert!(with_jitter >= ttl);
        assert!(with_jitter <= ttl + ttl / 10);
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let (cache, _) = cache();
        let item = Item { title: "A".into() };

        cache.set("v1:content:item:1", &item, None).await.unwrap();
        let cached: Option<Item> = cache.get("v1:content:item:1").await.unwrap();
        assert_eq!(cached, Some(item));
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_evicted() {
        let (cache, store) = cache();
        store
            .set("v1:content:list", b"{not json".to_vec(), None)
            .await
            .unwrap();

        let cached: Option<Vec<Item>> = cache.get("v1:content:list").await.unwrap();
        assert!(cached.is_none());
        assert!(!store.contains_key("v1:content:list"));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let (cache, store) = cache();
        store.set_available(false);

        assert!(cache.get::<Item>("v1:content:list").await.is_err());
        assert!(cache.del("v1:content:list").await.is_err());
    }
}
