use chrono::{DateTime, Utc};
use crypto_core::AccessTokenRequest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Canonical form used for uniqueness and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account model - core identity entity
///
/// `password_hash` is an Argon2id PHC string; the plaintext is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub normalized_email: String,
    pub password_hash: String,
    pub email_confirmed: bool,
    pub display_name: Option<String>,
    pub roles: BTreeSet<String>,
    pub claims: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn token_request(&self) -> AccessTokenRequest<'_> {
        AccessTokenRequest {
            subject_id: self.id,
            email: &self.email,
            roles: &self.roles,
            claims: &self.claims,
        }
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            email_confirmed: self.email_confirmed,
            roles: self.roles.iter().cloned().collect(),
            claims: self.claims.clone(),
            created_at: self.created_at,
        }
    }
}

/// Fields for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub normalized_email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub roles: BTreeSet<String>,
    pub claims: BTreeMap<String, String>,
}

/// Public account view (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub email_confirmed: bool,
    pub roles: Vec<String>,
    pub claims: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}
