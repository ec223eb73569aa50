//! Redis-backed cache store

use crate::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis_utils::SharedConnectionManager;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCacheStore {
    redis: SharedConnectionManager,
}

impl RedisCacheStore {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.redis.lock().await;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::Redis)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        match ttl {
            // SETEX rejects 0; round sub-second TTLs up
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .await
                .map_err(CacheError::Redis)?,
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(CacheError::Redis)?,
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        conn.del::<_, ()>(key).await.map_err(CacheError::Redis)?;
        Ok(())
    }
}
