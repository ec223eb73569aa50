/// Data models for content-service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Published content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Writable fields of a content item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContentDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, alias = "content")]
    pub body: String,
}
