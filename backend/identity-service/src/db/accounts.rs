/// Postgres account repository
use super::AccountRepository;
use crate::error::{IdentityError, Result};
use crate::models::{Account, NewAccount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Account database record
#[derive(Debug, sqlx::FromRow)]
struct AccountRecord {
    id: Uuid,
    email: String,
    normalized_email: String,
    password_hash: String,
    email_confirmed: bool,
    display_name: Option<String>,
    roles: Vec<String>,
    claims: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account {
            id: record.id,
            email: record.email,
            normalized_email: record.normalized_email,
            password_hash: record.password_hash,
            email_confirmed: record.email_confirmed,
            display_name: record.display_name,
            roles: record.roles.into_iter().collect(),
            claims: record.claims.0,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, normalized_email, password_hash, email_confirmed, \
     display_name, roles, claims, created_at, updated_at";

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Account::from))
    }

    async fn find_by_normalized_email(&self, normalized_email: &str) -> Result<Option<Account>> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE normalized_email = $1"
        ))
        .bind(normalized_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Account::from))
    }

    async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        let roles: Vec<String> = account.roles.into_iter().collect();

        // Unique violations on normalized_email surface as EmailAlreadyExists
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            r#"
            INSERT INTO accounts (id, email, normalized_email, password_hash, email_confirmed,
                                  display_name, roles, claims, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7, $8)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.normalized_email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(&roles)
        .bind(Json(&account.claims))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn replace(&self, account: &Account) -> Result<()> {
        let roles: Vec<String> = account.roles.iter().cloned().collect();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2,
                normalized_email = $3,
                password_hash = $4,
                email_confirmed = $5,
                display_name = $6,
                roles = $7,
                claims = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.normalized_email)
        .bind(&account.password_hash)
        .bind(account.email_confirmed)
        .bind(&account.display_name)
        .bind(&roles)
        .bind(Json(&account.claims))
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }
}
