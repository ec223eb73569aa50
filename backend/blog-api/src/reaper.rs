//! Periodic cleanup of spent and expired single-use tokens

use identity_service::config::ReaperSettings;
use identity_service::services::TokenManager;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

pub struct TokenReaperJob {
    tokens: TokenManager,
    interval: Duration,
    retention: chrono::Duration,
}

impl TokenReaperJob {
    pub fn new(tokens: TokenManager, settings: &ReaperSettings) -> Self {
        Self {
            tokens,
            interval: settings.interval,
            retention: settings.retention,
        }
    }

    pub async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        info!(
            "Token reaper started (interval: {:?}, retention: {}d)",
            self.interval,
            self.retention.num_days()
        );

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// One purge pass; failures are logged and retried on the next tick
    pub async fn run_once(&self) -> u64 {
        match self.tokens.purge_stale_tokens(self.retention).await {
            Ok(purged) => {
                debug!(purged, "Token reaper pass complete");
                purged
            }
            Err(err) => {
                warn!(error = %err, "Token reaper pass failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use identity_service::db::InMemoryTokenRepository;
    use identity_service::models::TokenKind;
    use identity_service::security::ManualClock;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_run_once_purges_only_stale_tokens() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let repo = Arc::new(InMemoryTokenRepository::new());
        let tokens = TokenManager::new(repo.clone(), clock.clone());

        tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();
        clock.advance(chrono::Duration::days(40));
        tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();

        let settings = ReaperSettings {
            interval: Duration::from_secs(3600),
            retention: chrono::Duration::days(30),
        };
        let job = TokenReaperJob::new(tokens, &settings);

        assert_eq!(job.run_once().await, 1);
        assert_eq!(repo.all(TokenKind::PasswordReset).len(), 1);
        assert_eq!(job.run_once().await, 0);
    }

    #[tokio::test]
    async fn test_run_once_survives_storage_fault() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let repo = Arc::new(InMemoryTokenRepository::new());
        repo.set_available(false);

        let settings = ReaperSettings {
            interval: Duration::from_secs(60),
            retention: chrono::Duration::days(1),
        };
        let job = TokenReaperJob::new(TokenManager::new(repo, clock), &settings);
        assert_eq!(job.run_once().await, 0);
    }
}
