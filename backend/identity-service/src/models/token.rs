use chrono::{DateTime, Duration, Utc};
use std::fmt;
use uuid::Uuid;

/// The two single-use token families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EmailConfirmation,
    PasswordReset,
}

impl TokenKind {
    /// Validity window from issuance
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::EmailConfirmation => Duration::hours(24),
            TokenKind::PasswordReset => Duration::hours(2),
        }
    }

    /// Backing table; each kind lives in its own collection
    pub fn table(&self) -> &'static str {
        match self {
            TokenKind::EmailConfirmation => "email_confirmation_tokens",
            TokenKind::PasswordReset => "password_reset_tokens",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::EmailConfirmation => "email_confirmation",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted single-use token record
///
/// Only the SHA-256 hex digest of the opaque token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralToken {
    pub id: Uuid,
    pub kind: TokenKind,
    pub account_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl EphemeralToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Freshly issued token: the raw string is only available here
pub struct IssuedToken {
    pub raw: String,
    pub record: EphemeralToken,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("raw", &"[REDACTED]")
            .field("record", &self.record)
            .finish()
    }
}
