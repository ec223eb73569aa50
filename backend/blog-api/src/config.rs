//! Process configuration for the blog API binary

use anyhow::{anyhow, Context, Result};
use content_service::config::ContentSettings;
use db_pool::DbConfig;
use identity_service::config::Settings as IdentitySettings;
use std::env;
use std::time::Duration;

const SERVICE_NAME: &str = "blog-api";

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DbConfig,
    pub redis_url: String,
    pub redis_connect_timeout: Duration,
    pub identity: IdentitySettings,
    pub content: ContentSettings,
}

impl AppConfig {
    /// Load from the environment; debug builds also read `.env`
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        let server = ServerSettings {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            workers: env::var("SERVER_WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("Invalid SERVER_WORKERS")?,
        };

        let database = DbConfig::from_env(SERVICE_NAME).map_err(|e| anyhow!(e))?;

        let redis_url = env::var("REDIS_URL").context("REDIS_URL must be set")?;
        let redis_connect_timeout = Duration::from_millis(
            env::var("REDIS_CONNECT_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid REDIS_CONNECT_TIMEOUT_MS")?,
        );

        Ok(Self {
            server,
            database,
            redis_url,
            redis_connect_timeout,
            identity: IdentitySettings::from_env()?,
            content: ContentSettings::from_env()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
