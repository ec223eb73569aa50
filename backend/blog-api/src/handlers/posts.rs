/// Blog post HTTP handlers
///
/// Reads are public. Writes need a bearer token carrying `CanPost=true` and
/// are attributed to the caller's email.
use crate::error::Result;
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use content_service::{ContentDraft, ContentStore};
use uuid::Uuid;

/// GET /posts
pub async fn list_posts(store: web::Data<ContentStore>) -> Result<HttpResponse> {
    let items = store.list().await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /posts/{id}
pub async fn get_post(store: web::Data<ContentStore>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let item = store.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// POST /posts
pub async fn create_post(
    store: web::Data<ContentStore>,
    user: AuthenticatedUser,
    body: web::Json<ContentDraft>,
) -> Result<HttpResponse> {
    user.require_can_post()?;
    let item = store.create(body.into_inner(), user.email()).await?;
    Ok(HttpResponse::Created().json(item))
}

/// PUT /posts/{id}
pub async fn update_post(
    store: web::Data<ContentStore>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<ContentDraft>,
) -> Result<HttpResponse> {
    user.require_can_post()?;
    let item = store
        .update(path.into_inner(), body.into_inner(), user.email())
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    store: web::Data<ContentStore>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    user.require_can_post()?;
    store.delete(path.into_inner(), user.email()).await?;
    Ok(HttpResponse::NoContent().finish())
}
