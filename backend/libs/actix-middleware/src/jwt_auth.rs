use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use crypto_core::{Claims, JwtCodec};
use futures::future::{ready, Ready};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Authentication and authorization failures surfaced to HTTP callers
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid Authorization header format")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Token validation is not configured")]
    NotConfigured,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Verified caller identity, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub claims: Claims,
}

impl AuthenticatedUser {
    fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        let account_id = claims.subject_id().map_err(|e| {
            tracing::warn!(error = %e, "Token subject is not a UUID");
            AuthError::InvalidToken
        })?;
        Ok(Self { account_id, claims })
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }
}

fn bearer_token(req_headers: &header::HeaderMap) -> Result<&str, AuthError> {
    let value = req_headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

fn authenticate(codec: &JwtCodec, headers: &header::HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = codec.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "JWT validation failed");
        AuthError::InvalidToken
    })?;
    AuthenticatedUser::from_claims(claims)
}

/// JWT Authentication Middleware
///
/// Rejects requests without a valid bearer token; on success the
/// `AuthenticatedUser` is available to handlers.
pub struct JwtAuthMiddleware {
    codec: Arc<JwtCodec>,
}

impl JwtAuthMiddleware {
    pub fn new(codec: Arc<JwtCodec>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    codec: Arc<JwtCodec>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            let user = authenticate(&codec, req.headers())?;
            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

/// Extractor for the authenticated caller
///
/// Uses the identity inserted by `JwtAuthMiddleware` when present, otherwise
/// verifies the bearer token with the `JwtCodec` registered as app data. This
/// lets routes that mix public and protected methods share one resource.
impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
            return ready(Ok(user.clone()));
        }

        let result = match req.app_data::<web::Data<JwtCodec>>() {
            Some(codec) => authenticate(codec, req.headers()),
            None => Err(AuthError::NotConfigured),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App, HttpResponse};
    use crypto_core::{AccessTokenRequest, JwtConfig};
    use std::collections::{BTreeMap, BTreeSet};

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    fn codec() -> JwtCodec {
        JwtCodec::new(JwtConfig::new(SECRET, "blog-api", "blog-clients")).unwrap()
    }

    fn token_for(codec: &JwtCodec, id: Uuid) -> String {
        let roles: BTreeSet<String> = ["User".to_string()].into();
        let claims = BTreeMap::new();
        codec
            .issue(AccessTokenRequest {
                subject_id: id,
                email: "reader@example.com",
                roles: &roles,
                claims: &claims,
            })
            .unwrap()
            .token
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.account_id.to_string())
    }

    #[actix_rt::test]
    async fn test_middleware_rejects_missing_header() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(Arc::new(codec())))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_middleware_accepts_valid_token() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = token_for(&codec, id);
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(Arc::new(codec)))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, id.to_string().as_bytes());
    }

    #[actix_rt::test]
    async fn test_extractor_falls_back_to_app_data_codec() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = token_for(&codec, id);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(codec))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let ok = test::TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, ok).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let bad = test::TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, bad).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[::core::prelude::v1::test]
    fn test_bearer_token_parsing() {
        let mut headers = header::HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingToken)));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(matches!(bearer_token(&headers), Err(AuthError::MalformedHeader)));

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
