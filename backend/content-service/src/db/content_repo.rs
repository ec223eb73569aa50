use super::ContentRepository;
use crate::error::Result;
use crate::models::{ContentDraft, ContentItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn list_newest_first(&self) -> Result<Vec<ContentItem>> {
        let items = sqlx::query_as::<_, ContentItem>(
            r#"
            SELECT id, title, body, created_by, updated_by, created_at, updated_at
            FROM content_items
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>(
            r#"
            SELECT id, title, body, created_by, updated_by, created_at, updated_at
            FROM content_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn insert(
        &self,
        draft: &ContentDraft,
        created_by: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ContentItem> {
        let item = sqlx::query_as::<_, ContentItem>(
            r#"
            INSERT INTO content_items (title, body, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, body, created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(created_by)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn replace(&self, item: &ContentItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET title = $2, body = $3, created_by = $4, updated_by = $5,
                created_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.body)
        .bind(&item.created_by)
        .bind(&item.updated_by)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
