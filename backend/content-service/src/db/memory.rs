//! In-process content repository with per-operation call counters and
//! fault injection

use super::ContentRepository;
use crate::error::{ContentError, Result};
use crate::models::{ContentDraft, ContentItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryContentRepository {
    items: DashMap<Uuid, ContentItem>,
    unavailable: AtomicBool,
    list_calls: AtomicUsize,
    find_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Read calls of any kind
    pub fn query_count(&self) -> usize {
        self.list_calls() + self.find_calls()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ContentError::Database("in-memory store marked unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn list_newest_first(&self) -> Result<Vec<ContentItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut items: Vec<ContentItem> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.items.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(
        &self,
        draft: &ContentDraft,
        created_by: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ContentItem> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let item = ContentItem {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            created_by: created_by.to_string(),
            updated_by: None,
            created_at,
            updated_at: None,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn replace(&self, item: &ContentItem) -> Result<bool> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        match self.items.get_mut(&item.id) {
            Some(mut existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.items.remove(&id).is_some())
    }
}
