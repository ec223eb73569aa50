/// Configuration for the content store
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ContentSettings {
    /// Expiry for cached entries; `None` keeps them until invalidated
    pub cache_ttl: Option<Duration>,
}

impl ContentSettings {
    pub fn from_env() -> Result<Self> {
        let cache_ttl = match env::var("CONTENT_CACHE_TTL_SECONDS") {
            Ok(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .context("Invalid CONTENT_CACHE_TTL_SECONDS")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            _ => None,
        };
        Ok(Self { cache_ttl })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_ttl_unset_means_no_expiry() {
        env::remove_var("CONTENT_CACHE_TTL_SECONDS");
        assert!(ContentSettings::from_env().unwrap().cache_ttl.is_none());
    }

    #[test]
    #[serial]
    fn test_ttl_parsed() {
        env::set_var("CONTENT_CACHE_TTL_SECONDS", "300");
        assert_eq!(
            ContentSettings::from_env().unwrap().cache_ttl,
            Some(Duration::from_secs(300))
        );
        env::set_var("CONTENT_CACHE_TTL_SECONDS", "soon");
        assert!(ContentSettings::from_env().is_err());
        env::remove_var("CONTENT_CACHE_TTL_SECONDS");
    }
}
