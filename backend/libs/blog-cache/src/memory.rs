//! In-process cache store
//!
//! Used by tests and by local runs without Redis. Supports outage simulation
//! (`set_available(false)`) and per-operation counters so callers can assert
//! on cache traffic.

use crate::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, Entry>,
    unavailable: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
    dels: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a cache outage: every operation fails while unavailable
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn del_count(&self) -> usize {
        self.dels.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("in-memory cache marked unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.dels.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let store = InMemoryCacheStore::new();
        store.set("k", b"v".to_vec(), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.get_count(), 2);
        assert_eq!(store.set_count(), 1);
        assert_eq!(store.del_count(), 1);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", b"v".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(store.contains_key("k"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.contains_key("k"));
    }

    #[tokio::test]
    async fn test_outage_fails_every_operation() {
        let store = InMemoryCacheStore::new();
        store.set_available(false);

        assert!(matches!(store.get("k").await, Err(CacheError::Unavailable(_))));
        assert!(store.set("k", vec![], None).await.is_err());
        assert!(store.del("k").await.is_err());

        store.set_available(true);
        assert!(store.get("k").await.unwrap().is_none());
    }
}
