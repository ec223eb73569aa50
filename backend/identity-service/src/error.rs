use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Unknown, expired and already-used tokens are deliberately indistinguishable
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IdentityError {
    /// True for faults that must not leak details to callers
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            IdentityError::Database(_)
                | IdentityError::JwtError(_)
                | IdentityError::Email(_)
                | IdentityError::Internal(_)
        )
    }
}

// Conversions from external error types
impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return IdentityError::EmailAlreadyExists;
            }
        }
        tracing::error!("Database error: {}", err);
        IdentityError::Database(err.to_string())
    }
}

impl From<crypto_core::JwtError> for IdentityError {
    fn from(err: crypto_core::JwtError) -> Self {
        tracing::error!("JWT error: {}", err);
        IdentityError::JwtError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for IdentityError {
    fn from(err: tokio::task::JoinError) -> Self {
        IdentityError::Internal(format!("Blocking task failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(err: validator::ValidationErrors) -> Self {
        IdentityError::Validation(err.to_string())
    }
}
