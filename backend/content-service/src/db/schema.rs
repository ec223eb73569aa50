use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// Ensure the content table exists.
pub async fn ensure_content_tables(pool: &PgPool) -> Result<()> {
    info!("Ensuring content tables exist");

    sqlx::query(CONTENT_ITEMS_TABLE).execute(pool).await?;
    sqlx::query(CONTENT_ITEMS_CREATED_INDEX).execute(pool).await?;

    Ok(())
}

const CONTENT_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS content_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT '',
    created_by TEXT NOT NULL,
    updated_by TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
)
"#;

const CONTENT_ITEMS_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_content_items_created_at ON content_items (created_at DESC)";
