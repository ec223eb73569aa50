//! Document store adapters for accounts and single-use tokens
//!
//! Each repository is an async trait with a Postgres implementation and an
//! in-memory implementation (see [`memory`]) used by tests and local runs.

pub mod accounts;
pub mod memory;
pub mod schema;
pub mod tokens;

use crate::error::Result;
use crate::models::{Account, EphemeralToken, NewAccount, TokenKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use accounts::PgAccountRepository;
pub use memory::{InMemoryAccountRepository, InMemoryTokenRepository};
pub use schema::ensure_identity_tables;
pub use tokens::PgTokenRepository;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_by_normalized_email(&self, normalized_email: &str) -> Result<Option<Account>>;

    /// Insert a new account; a taken normalized email fails with
    /// `IdentityError::EmailAlreadyExists`
    async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account>;

    /// Replace the stored account by id; `IdentityError::UserNotFound` if absent
    async fn replace(&self, account: &Account) -> Result<()>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: &EphemeralToken) -> Result<()>;

    /// Lookup filtered to `used = false AND expires_at > now`
    async fn find_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralToken>>;

    /// Conditionally flip `used`; returns false when it was already set
    async fn mark_used(&self, kind: TokenKind, id: Uuid, now: DateTime<Utc>) -> Result<bool>;

    /// Delete tokens that expired before `cutoff`
    async fn purge_expired_before(&self, kind: TokenKind, cutoff: DateTime<Utc>) -> Result<u64>;
}
