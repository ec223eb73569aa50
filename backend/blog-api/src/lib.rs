//! Blog HTTP API
//!
//! Thin actix-web surface over the identity service and the content store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod reaper;

use actix_middleware::JwtAuthMiddleware;
use actix_web::{web, HttpResponse};
use crypto_core::JwtCodec;
use std::sync::Arc;

pub use error::ApiError;

/// Register every route
///
/// Expects `web::Data<IdentityService>` and `web::Data<ContentStore>` as app
/// data. The codec is registered here for the `AuthenticatedUser` extractor.
pub fn routes(cfg: &mut web::ServiceConfig, codec: Arc<JwtCodec>) {
    cfg.app_data(web::Data::from(codec.clone()))
        .app_data(json_config())
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/confirm-email", web::get().to(handlers::auth::confirm_email))
                .route("/login", web::post().to(handlers::auth::login))
                .route("/forgot-password", web::post().to(handlers::auth::forgot_password))
                .route("/reset-password", web::post().to(handlers::auth::reset_password))
                .service(
                    web::resource("/me")
                        .wrap(JwtAuthMiddleware::new(codec.clone()))
                        .route(web::get().to(handlers::auth::me))
                        .route(web::put().to(handlers::auth::update_me)),
                )
                .service(
                    web::resource("/can-post-check")
                        .wrap(JwtAuthMiddleware::new(codec.clone()))
                        .route(web::get().to(handlers::auth::can_post_check)),
                )
                .service(
                    web::resource("/{id}/role")
                        .wrap(JwtAuthMiddleware::new(codec))
                        .route(web::post().to(handlers::auth::grant_role)),
                ),
        )
        // Reads are public; writes authenticate through the extractor
        .service(
            web::resource("/posts")
                .route(web::get().to(handlers::posts::list_posts))
                .route(web::post().to(handlers::posts::create_post)),
        )
        .service(
            web::resource("/posts/{id}")
                .route(web::get().to(handlers::posts::get_post))
                .route(web::put().to(handlers::posts::update_post))
                .route(web::delete().to(handlers::posts::delete_post)),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let body = serde_json::json!({
                "error": format!("Bad request: {}", err),
                "status": 400,
            });
            actix_web::error::InternalError::from_response(err, HttpResponse::BadRequest().json(body))
                .into()
        })
}
