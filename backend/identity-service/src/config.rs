//! Configuration management for the identity service
//!
//! Settings come from environment variables. The binary is responsible for
//! loading a `.env` file before calling [`Settings::from_env`].

use anyhow::{bail, Context, Result};
use crypto_core::jwt::{DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_CLOCK_SKEW_SECONDS, MIN_SECRET_BYTES};
use crypto_core::JwtConfig;
use std::env;
use std::fmt;
use std::time::Duration;

/// Only empty passwords are rejected unless PASSWORD_MIN_LENGTH raises it
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 1;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Identity settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt: JwtConfig,
    pub email: EmailSettings,
    /// Base URL used to build confirmation and reset links
    pub public_base_url: String,
    pub password_min_length: usize,
    pub reaper: ReaperSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            jwt: jwt_config_from_env()?,
            email: EmailSettings::from_env()?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            password_min_length: env::var("PASSWORD_MIN_LENGTH")
                .unwrap_or_else(|_| DEFAULT_PASSWORD_MIN_LENGTH.to_string())
                .parse()
                .context("Invalid PASSWORD_MIN_LENGTH")?,
            reaper: ReaperSettings::from_env()?,
        })
    }
}

fn jwt_config_from_env() -> Result<JwtConfig> {
    let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    if secret.len() < MIN_SECRET_BYTES {
        bail!("JWT_SECRET must be at least {} bytes", MIN_SECRET_BYTES);
    }

    let mut config = JwtConfig::new(
        secret,
        env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-api".to_string()),
        env::var("JWT_AUDIENCE").unwrap_or_else(|_| "blog-clients".to_string()),
    );
    config.access_token_minutes = env::var("JWT_ACCESS_TOKEN_MINUTES")
        .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_MINUTES.to_string())
        .parse()
        .context("Invalid JWT_ACCESS_TOKEN_MINUTES")?;
    config.clock_skew_seconds = env::var("JWT_CLOCK_SKEW_SECONDS")
        .unwrap_or_else(|_| DEFAULT_CLOCK_SKEW_SECONDS.to_string())
        .parse()
        .context("Invalid JWT_CLOCK_SKEW_SECONDS")?;

    Ok(config)
}

/// SMTP settings; an empty host selects the no-op sender
#[derive(Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("smtp_from", &self.smtp_from)
            .field("use_starttls", &self.use_starttls)
            .finish()
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@blog.local".to_string(),
            use_starttls: true,
        }
    }
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@blog.local".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid SMTP_USE_STARTTLS")?,
        })
    }
}

/// Stale token reaper schedule
#[derive(Debug, Clone)]
pub struct ReaperSettings {
    pub interval: Duration,
    /// Tokens whose expiry is older than this are deleted
    pub retention: chrono::Duration,
}

impl ReaperSettings {
    fn from_env() -> Result<Self> {
        let interval_secs: u64 = env::var("TOKEN_REAPER_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Invalid TOKEN_REAPER_INTERVAL_SECONDS")?;
        let retention_days: i64 = env::var("TOKEN_RETENTION_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid TOKEN_RETENTION_DAYS")?;
        if retention_days < 1 {
            bail!("TOKEN_RETENTION_DAYS must be at least 1");
        }

        Ok(Self {
            interval: Duration::from_secs(interval_secs.max(1)),
            retention: chrono::Duration::days(retention_days),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "config-test-secret-0123456789abcdefghij";

    fn clear_env() {
        for key in [
            "JWT_SECRET",
            "JWT_ISSUER",
            "JWT_AUDIENCE",
            "JWT_ACCESS_TOKEN_MINUTES",
            "JWT_CLOCK_SKEW_SECONDS",
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_PASSWORD",
            "PUBLIC_BASE_URL",
            "PASSWORD_MIN_LENGTH",
            "TOKEN_REAPER_INTERVAL_SECONDS",
            "TOKEN_RETENTION_DAYS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        env::set_var("JWT_SECRET", SECRET);

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.jwt.issuer, "blog-api");
        assert_eq!(settings.jwt.audience, "blog-clients");
        assert_eq!(settings.jwt.access_token_minutes, 60);
        assert_eq!(settings.jwt.clock_skew_seconds, 30);
        assert_eq!(settings.email.smtp_port, 587);
        assert!(settings.email.smtp_host.is_empty());
        assert_eq!(settings.public_base_url, "http://localhost:8080");
        assert_eq!(settings.password_min_length, DEFAULT_PASSWORD_MIN_LENGTH);
        assert_eq!(settings.reaper.retention, chrono::Duration::days(30));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret_fails() {
        clear_env();
        assert!(Settings::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_short_secret_fails() {
        clear_env();
        env::set_var("JWT_SECRET", "too-short");
        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains("at least"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_base_url_trailing_slash_trimmed() {
        clear_env();
        env::set_var("JWT_SECRET", SECRET);
        env::set_var("PUBLIC_BASE_URL", "https://blog.example.com/");

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.public_base_url, "https://blog.example.com");
        clear_env();
    }

    #[test]
    fn test_email_settings_debug_redacts_password() {
        let settings = EmailSettings {
            smtp_password: Some("hunter2".into()),
            ..EmailSettings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
    }
}
