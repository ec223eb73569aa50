/// HTTP error mapping for the blog API
///
/// Internal faults are logged and reported without details.
use actix_middleware::AuthError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use content_service::ContentError;
use identity_service::IdentityError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn is_internal(&self) -> bool {
        match self {
            ApiError::Identity(e) => e.is_internal(),
            ApiError::Content(ContentError::Database(_)) => true,
            _ => self.status_code() == StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Identity(e) => match e {
                IdentityError::InvalidCredentials | IdentityError::EmailNotConfirmed => {
                    StatusCode::UNAUTHORIZED
                }
                IdentityError::UserNotFound => StatusCode::NOT_FOUND,
                IdentityError::EmailAlreadyExists => StatusCode::CONFLICT,
                IdentityError::InvalidEmail(_)
                | IdentityError::WeakPassword(_)
                | IdentityError::InvalidToken
                | IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
                IdentityError::Database(_)
                | IdentityError::JwtError(_)
                | IdentityError::Email(_)
                | IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Content(e) => match e {
                ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                ContentError::Validation(_) => StatusCode::BAD_REQUEST,
                ContentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = if self.is_internal() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}
