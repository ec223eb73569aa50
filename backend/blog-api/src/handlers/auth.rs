/// Account HTTP handlers
use crate::error::Result;
use actix_middleware::{AuthenticatedUser, ROLE_ADMIN};
use actix_web::{web, HttpResponse};
use identity_service::services::{
    IdentityService, LoginInput, RegisterInput, ResetPasswordInput, UpdateProfileInput,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

/// POST /api/auth/register
pub async fn register(
    identity: web::Data<IdentityService>,
    body: web::Json<RegisterInput>,
) -> Result<HttpResponse> {
    let outcome = identity.register(body.into_inner()).await?;
    let message = if outcome.email_dispatched {
        "Registration successful. Please check your email to confirm your account."
    } else {
        "Registration successful, but the confirmation email could not be sent."
    };

    Ok(HttpResponse::Created().json(json!({
        "message": message,
        "account": outcome.account,
        "email_dispatched": outcome.email_dispatched,
    })))
}

/// GET /api/auth/confirm-email?token=...
pub async fn confirm_email(
    identity: web::Data<IdentityService>,
    query: web::Query<TokenQuery>,
) -> Result<HttpResponse> {
    let token = query.into_inner().token.unwrap_or_default();
    identity.confirm_email(&token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Email confirmed successfully." })))
}

/// POST /api/auth/login
pub async fn login(
    identity: web::Data<IdentityService>,
    body: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let outcome = identity.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/auth/forgot-password
///
/// Same answer whether or not the email belongs to an account.
pub async fn forgot_password(
    identity: web::Data<IdentityService>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse> {
    identity.forgot_password(&body.email).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "If the email exists, a reset link has been sent."
    })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    identity: web::Data<IdentityService>,
    body: web::Json<ResetPasswordInput>,
) -> Result<HttpResponse> {
    identity.reset_password(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password has been reset successfully." })))
}

/// GET /api/auth/me
pub async fn me(
    identity: web::Data<IdentityService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let profile = identity.get_profile(user.account_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/auth/me
pub async fn update_me(
    identity: web::Data<IdentityService>,
    user: AuthenticatedUser,
    body: web::Json<UpdateProfileInput>,
) -> Result<HttpResponse> {
    let profile = identity
        .update_profile(user.account_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/auth/{id}/role?role=Admin
pub async fn grant_role(
    identity: web::Data<IdentityService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<RoleQuery>,
) -> Result<HttpResponse> {
    user.require_role(ROLE_ADMIN)?;
    let profile = identity.grant_role(path.into_inner(), &query.role).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/auth/can-post-check
pub async fn can_post_check(user: AuthenticatedUser) -> Result<HttpResponse> {
    user.require_can_post()?;
    Ok(HttpResponse::Ok().json(json!({ "message": "You can post" })))
}
