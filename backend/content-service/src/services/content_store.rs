/// Content store - cache-aside reads and write-then-invalidate
use crate::db::ContentRepository;
use crate::error::{ContentError, Result};
use crate::models::{ContentDraft, ContentItem};
use blog_cache::{BlogCache, CacheKey};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// The repository is the source of truth; cache entries are disposable
/// copies. Every write commits to the repository before any cache key is
/// invalidated, and cache faults never fail an operation.
#[derive(Clone)]
pub struct ContentStore {
    repo: Arc<dyn ContentRepository>,
    cache: BlogCache,
    cache_ttl: Option<Duration>,
}

impl ContentStore {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        cache: BlogCache,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            repo,
            cache,
            cache_ttl,
        }
    }

    /// All items, newest first
    pub async fn list(&self) -> Result<Vec<ContentItem>> {
        let key = CacheKey::content_list();
        if let Some(items) = self.cached::<Vec<ContentItem>>(&key).await {
            return Ok(items);
        }

        let items = self.repo.list_newest_first().await?;
        self.populate(&key, &items).await;
        Ok(items)
    }

    pub async fn get(&self, id: Uuid) -> Result<ContentItem> {
        let key = CacheKey::content_item(id);
        if let Some(item) = self.cached::<ContentItem>(&key).await {
            return Ok(item);
        }

        // Misses are not cached
        let item = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(ContentError::NotFound(id))?;
        self.populate(&key, &item).await;
        Ok(item)
    }

    pub async fn create(&self, draft: ContentDraft, actor: &str) -> Result<ContentItem> {
        draft.validate()?;

        let item = self.repo.insert(&draft, actor, Utc::now()).await?;
        info!(content_id = %item.id, actor, "Content item created");

        self.invalidate(&[CacheKey::content_list()]).await;
        Ok(item)
    }

    /// Replace title and body; creation fields are preserved
    pub async fn update(&self, id: Uuid, draft: ContentDraft, actor: &str) -> Result<ContentItem> {
        draft.validate()?;

        let mut item = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(ContentError::NotFound(id))?;
        item.title = draft.title;
        item.body = draft.body;
        item.updated_by = Some(actor.to_string());
        item.updated_at = Some(Utc::now());

        if !self.repo.replace(&item).await? {
            return Err(ContentError::NotFound(id));
        }
        info!(content_id = %id, actor, "Content item updated");

        self.invalidate(&[CacheKey::content_list(), CacheKey::content_item(id)])
            .await;
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid, actor: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(ContentError::NotFound(id));
        }
        info!(content_id = %id, actor, "Content item deleted");

        self.invalidate(&[CacheKey::content_list(), CacheKey::content_item(id)])
            .await;
        Ok(())
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed; falling back to store");
                None
            }
        }
    }

    async fn populate<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value, self.cache_ttl).await {
            debug!(key = %key, error = %e, "Cache population failed");
        }
    }

    async fn invalidate(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.cache.del(key).await {
                // Entry may serve stale data until its TTL (if any) lapses
                warn!(key = %key, error = %e, "Cache invalidation failed after committed write");
            }
        }
    }
}
