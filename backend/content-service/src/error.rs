/// Error types for the content service
use thiserror::Error;
use uuid::Uuid;

/// Result type for content-service operations
pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content item not found: {0}")]
    NotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ContentError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        ContentError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ContentError {
    fn from(err: validator::ValidationErrors) -> Self {
        ContentError::Validation(err.to_string())
    }
}
