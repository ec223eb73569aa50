//! In-process repositories
//!
//! Behave like the Postgres adapters (unique normalized email, conditional
//! mark-used) and add fault injection for exercising storage failures.

use super::{AccountRepository, TokenRepository};
use crate::error::{IdentityError, Result};
use crate::models::{Account, EphemeralToken, NewAccount, TokenKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

fn check_available(unavailable: &AtomicBool) -> Result<()> {
    if unavailable.load(Ordering::SeqCst) {
        Err(IdentityError::Database("in-memory store marked unavailable".into()))
    } else {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<Uuid, Account>,
    by_email: DashMap<String, Uuid>,
    unavailable: AtomicBool,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        check_available(&self.unavailable)?;
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn find_by_normalized_email(&self, normalized_email: &str) -> Result<Option<Account>> {
        check_available(&self.unavailable)?;
        let Some(id) = self.by_email.get(normalized_email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        check_available(&self.unavailable)?;

        // The email index entry acts as the unique constraint
        match self.by_email.entry(account.normalized_email.clone()) {
            Entry::Occupied(_) => Err(IdentityError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                let stored = Account {
                    id: Uuid::new_v4(),
                    email: account.email,
                    normalized_email: account.normalized_email,
                    password_hash: account.password_hash,
                    email_confirmed: false,
                    display_name: account.display_name,
                    roles: account.roles,
                    claims: account.claims,
                    created_at: now,
                    updated_at: None,
                };
                slot.insert(stored.id);
                self.accounts.insert(stored.id, stored.clone());
                Ok(stored)
            }
        }
    }

    async fn replace(&self, account: &Account) -> Result<()> {
        check_available(&self.unavailable)?;
        match self.accounts.get_mut(&account.id) {
            Some(mut existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(IdentityError::UserNotFound),
        }
    }
}

#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: DashMap<(TokenKind, Uuid), EphemeralToken>,
    unavailable: AtomicBool,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Every stored token of a kind, valid or not
    pub fn all(&self, kind: TokenKind) -> Vec<EphemeralToken> {
        self.tokens
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: &EphemeralToken) -> Result<()> {
        check_available(&self.unavailable)?;
        self.tokens.insert((token.kind, token.id), token.clone());
        Ok(())
    }

    async fn find_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralToken>> {
        check_available(&self.unavailable)?;
        Ok(self
            .tokens
            .iter()
            .find(|entry| {
                let token = entry.value();
                token.kind == kind && token.token_hash == token_hash && token.is_valid_at(now)
            })
            .map(|entry| entry.value().clone()))
    }

    async fn mark_used(&self, kind: TokenKind, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        check_available(&self.unavailable)?;
        match self.tokens.get_mut(&(kind, id)) {
            Some(mut token) if !token.used => {
                token.used = true;
                token.used_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired_before(&self, kind: TokenKind, cutoff: DateTime<Utc>) -> Result<u64> {
        check_available(&self.unavailable)?;
        let before = self.tokens.len();
        self.tokens
            .retain(|(k, _), token| *k != kind || token.expires_at >= cutoff);
        Ok((before - self.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::{BTreeMap, BTreeSet};

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            normalized_email: crate::models::normalize_email(email),
            password_hash: "hash".into(),
            display_name: None,
            roles: BTreeSet::new(),
            claims: BTreeMap::new(),
        }
    }

    fn token(kind: TokenKind, hash: &str, expires_at: DateTime<Utc>) -> EphemeralToken {
        EphemeralToken {
            id: Uuid::new_v4(),
            kind,
            account_id: Uuid::new_v4(),
            token_hash: hash.to_string(),
            expires_at,
            used: false,
            created_at: expires_at - kind.lifetime(),
            used_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email_rejected() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(new_account("a@x.com"), Utc::now()).await.unwrap();

        let err = repo
            .insert(new_account("A@X.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailAlreadyExists));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_unknown_account() {
        let repo = InMemoryAccountRepository::new();
        let mut account = repo.insert(new_account("a@x.com"), Utc::now()).await.unwrap();
        account.id = Uuid::new_v4();
        assert!(matches!(
            repo.replace(&account).await,
            Err(IdentityError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_mark_used_is_conditional() {
        let repo = InMemoryTokenRepository::new();
        let now = Utc::now();
        let t = token(TokenKind::PasswordReset, "h1", now + Duration::hours(2));
        repo.insert(&t).await.unwrap();

        assert!(repo.mark_used(t.kind, t.id, now).await.unwrap());
        assert!(!repo.mark_used(t.kind, t.id, now).await.unwrap());
        assert!(repo.find_valid(t.kind, "h1", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kinds_are_separate_collections() {
        let repo = InMemoryTokenRepository::new();
        let now = Utc::now();
        let t = token(TokenKind::EmailConfirmation, "shared", now + Duration::hours(24));
        repo.insert(&t).await.unwrap();

        assert!(repo
            .find_valid(TokenKind::PasswordReset, "shared", now)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .find_valid(TokenKind::EmailConfirmation, "shared", now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_purge_only_removes_old_expired_tokens() {
        let repo = InMemoryTokenRepository::new();
        let now = Utc::now();
        let stale = token(TokenKind::PasswordReset, "old", now - Duration::days(40));
        let live = token(TokenKind::PasswordReset, "live", now + Duration::hours(1));
        repo.insert(&stale).await.unwrap();
        repo.insert(&live).await.unwrap();

        let purged = repo
            .purge_expired_before(TokenKind::PasswordReset, now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert_eq!(repo.all(TokenKind::PasswordReset), vec![live]);
    }

    #[tokio::test]
    async fn test_outage_propagates() {
        let repo = InMemoryTokenRepository::new();
        repo.set_available(false);
        let t = token(TokenKind::PasswordReset, "h", Utc::now());
        assert!(matches!(
            repo.insert(&t).await,
            Err(IdentityError::Database(_))
        ));
    }
}
