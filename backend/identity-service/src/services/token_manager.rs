//! Issuance, validation and single-use consumption of ephemeral tokens

use crate::db::TokenRepository;
use crate::error::Result;
use crate::models::{EphemeralToken, IssuedToken, TokenKind};
use crate::security::Clock;
use crypto_core::{generate_opaque_token, sha256_hex};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct TokenManager {
    tokens: Arc<dyn TokenRepository>,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    pub fn new(tokens: Arc<dyn TokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { tokens, clock }
    }

    /// New confirmation token valid for 24 hours
    pub async fn issue_email_confirmation_token(&self, account_id: Uuid) -> Result<IssuedToken> {
        self.issue(TokenKind::EmailConfirmation, account_id).await
    }

    /// New reset token valid for 2 hours
    pub async fn issue_password_reset_token(&self, account_id: Uuid) -> Result<IssuedToken> {
        self.issue(TokenKind::PasswordReset, account_id).await
    }

    async fn issue(&self, kind: TokenKind, account_id: Uuid) -> Result<IssuedToken> {
        let raw = generate_opaque_token();
        let now = self.clock.now();
        let record = EphemeralToken {
            id: Uuid::new_v4(),
            kind,
            account_id,
            token_hash: sha256_hex(&raw),
            expires_at: now + kind.lifetime(),
            used: false,
            created_at: now,
            used_at: None,
        };

        self.tokens.insert(&record).await?;
        debug!(%account_id, kind = %kind, expires_at = %record.expires_at, "Issued token");

        Ok(IssuedToken { raw, record })
    }

    /// Resolve an unused, unexpired token
    ///
    /// Unknown, expired and used tokens all resolve to `None`.
    pub async fn resolve_valid_token(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> Result<Option<EphemeralToken>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        self.tokens
            .find_valid(kind, &sha256_hex(token), self.clock.now())
            .await
    }

    /// Mark a resolved token used
    ///
    /// Returns false when another redemption already flipped the flag.
    pub async fn consume_token(&self, token: &EphemeralToken) -> Result<bool> {
        self.tokens
            .mark_used(token.kind, token.id, self.clock.now())
            .await
    }

    /// Delete tokens of both kinds that expired more than `retention` ago
    pub async fn purge_stale_tokens(&self, retention: chrono::Duration) -> Result<u64> {
        let cutoff = self.clock.now() - retention;
        let mut purged = 0;
        for kind in [TokenKind::EmailConfirmation, TokenKind::PasswordReset] {
            purged += self.tokens.purge_expired_before(kind, cutoff).await?;
        }
        if purged > 0 {
            info!(purged, %cutoff, "Purged stale tokens");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTokenRepository;
    use crate::security::ManualClock;
    use chrono::{Duration, Utc};

    fn manager() -> (TokenManager, Arc<ManualClock>, Arc<InMemoryTokenRepository>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let repo = Arc::new(InMemoryTokenRepository::new());
        (TokenManager::new(repo.clone(), clock.clone()), clock, repo)
    }

    #[tokio::test]
    async fn test_confirmation_token_valid_just_under_24h() {
        let (tokens, clock, _) = manager();
        let issued = tokens
            .issue_email_confirmation_token(Uuid::new_v4())
            .await
            .unwrap();

        clock.advance(Duration::hours(23) + Duration::minutes(59));
        let resolved = tokens
            .resolve_valid_token(TokenKind::EmailConfirmation, &issued.raw)
            .await
            .unwrap();
        assert_eq!(resolved.map(|t| t.id), Some(issued.record.id));

        clock.advance(Duration::minutes(2));
        assert!(tokens
            .resolve_valid_token(TokenKind::EmailConfirmation, &issued.raw)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reset_token_expires_after_2h() {
        let (tokens, clock, _) = manager();
        let issued = tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();
        assert_eq!(
            issued.record.expires_at - issued.record.created_at,
            Duration::hours(2)
        );

        clock.advance(Duration::hours(2));
        assert!(tokens
            .resolve_valid_token(TokenKind::PasswordReset, &issued.raw)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_consumed_token_never_resolves_again() {
        let (tokens, _, _) = manager();
        let issued = tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();

        let resolved = tokens
            .resolve_valid_token(TokenKind::PasswordReset, &issued.raw)
            .await
            .unwrap()
            .unwrap();
        assert!(tokens.consume_token(&resolved).await.unwrap());
        assert!(!tokens.consume_token(&resolved).await.unwrap());

        assert!(tokens
            .resolve_valid_token(TokenKind::PasswordReset, &issued.raw)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_kind_mismatch_does_not_resolve() {
        let (tokens, _, _) = manager();
        let issued = tokens
            .issue_email_confirmation_token(Uuid::new_v4())
            .await
            .unwrap();
        assert!(tokens
            .resolve_valid_token(TokenKind::PasswordReset, &issued.raw)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_only_digest_is_stored() {
        let (tokens, _, repo) = manager();
        let issued = tokens
            .issue_email_confirmation_token(Uuid::new_v4())
            .await
            .unwrap();

        let stored = repo.all(TokenKind::EmailConfirmation);
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].token_hash, issued.raw);
        assert_eq!(stored[0].token_hash, sha256_hex(&issued.raw));
    }

    #[tokio::test]
    async fn test_empty_token_is_negative() {
        let (tokens, _, _) = manager();
        assert!(tokens
            .resolve_valid_token(TokenKind::EmailConfirmation, "  ")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_issue_propagates_store_fault() {
        let (tokens, _, repo) = manager();
        repo.set_available(false);
        assert!(tokens
            .issue_password_reset_token(Uuid::new_v4())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_purge_keeps_recent_tokens() {
        let (tokens, clock, repo) = manager();
        tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();
        clock.advance(Duration::days(31));
        tokens.issue_password_reset_token(Uuid::new_v4()).await.unwrap();

        let purged = tokens.purge_stale_tokens(Duration::days(30)).await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(repo.all(TokenKind::PasswordReset).len(), 1);
    }
}
