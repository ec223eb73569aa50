//! Content repository adapters

pub mod content_repo;
pub mod memory;
pub mod schema;

use crate::error::Result;
use crate::models::{ContentDraft, ContentItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use content_repo::PgContentRepository;
pub use memory::InMemoryContentRepository;
pub use schema::ensure_content_tables;

/// Durable store for content items; identifiers are assigned on insert
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All items, newest first
    async fn list_newest_first(&self) -> Result<Vec<ContentItem>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>>;

    async fn insert(
        &self,
        draft: &ContentDraft,
        created_by: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ContentItem>;

    /// Replace by id; false when no such item exists
    async fn replace(&self, item: &ContentItem) -> Result<bool>;

    /// Delete by id; false when no such item exists
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
