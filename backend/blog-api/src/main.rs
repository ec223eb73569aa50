use actix_web::{web, App, HttpServer};
use anyhow::Context;
use blog_api::config::AppConfig;
use blog_api::reaper::TokenReaperJob;
use blog_cache::{BlogCache, RedisCacheStore};
use content_service::db::{ensure_content_tables, PgContentRepository};
use content_service::ContentStore;
use crypto_core::JwtCodec;
use db_pool::create_pool;
use identity_service::db::{ensure_identity_tables, PgAccountRepository, PgTokenRepository};
use identity_service::security::{Clock, SystemClock};
use identity_service::services::{build_email_sender, IdentityOptions, IdentityService, TokenManager};
use redis_utils::RedisPool;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!("Starting blog-api v{}", env!("CARGO_PKG_VERSION"));

    config.database.log_config();
    let pool = create_pool(config.database.clone())
        .await
        .context("Failed to create database pool")?;
    ensure_identity_tables(&pool)
        .await
        .context("Failed to ensure identity tables")?;
    ensure_content_tables(&pool)
        .await
        .context("Failed to ensure content tables")?;

    let redis = RedisPool::connect(&config.redis_url, config.redis_connect_timeout)
        .await
        .context("Failed to connect to Redis")?;
    let cache = BlogCache::new(Arc::new(RedisCacheStore::new(redis.manager())));

    let codec = Arc::new(JwtCodec::new(config.identity.jwt.clone()).context("Invalid JWT settings")?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = TokenManager::new(Arc::new(PgTokenRepository::new(pool.clone())), clock.clone());
    let email = build_email_sender(&config.identity.email)?;

    let identity = web::Data::new(IdentityService::new(
        Arc::new(PgAccountRepository::new(pool.clone())),
        tokens.clone(),
        codec.clone(),
        email,
        clock,
        IdentityOptions::from(&config.identity),
    ));
    let content = web::Data::new(ContentStore::new(
        Arc::new(PgContentRepository::new(pool.clone())),
        cache,
        config.content.cache_ttl,
    ));

    let reaper = TokenReaperJob::new(tokens, &config.identity.reaper).spawn();

    let bind_address = config.bind_address();
    tracing::info!("HTTP server listening on {}", bind_address);

    let result = HttpServer::new(move || {
        let codec = codec.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(identity.clone())
            .app_data(content.clone())
            .configure(move |cfg| blog_api::routes(cfg, codec))
    })
    .bind(&bind_address)?
    .workers(config.server.workers)
    .run()
    .await;

    reaper.abort();
    pool.close().await;
    tracing::info!("blog-api stopped");

    result.map_err(Into::into)
}
