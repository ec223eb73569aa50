/// Postgres single-use token repository
///
/// One table per token kind; see [`TokenKind::table`].
use super::TokenRepository;
use crate::error::Result;
use crate::models::{EphemeralToken, TokenKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct TokenRecord {
    id: Uuid,
    account_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    fn into_token(self, kind: TokenKind) -> EphemeralToken {
        EphemeralToken {
            id: self.id,
            kind,
            account_id: self.account_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            used: self.used,
            created_at: self.created_at,
            used_at: self.used_at,
        }
    }
}

#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(&self, token: &EphemeralToken) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, account_id, token_hash, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            token.kind.table()
        ))
        .bind(token.id)
        .bind(token.account_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EphemeralToken>> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!(
            r#"
            SELECT id, account_id, token_hash, expires_at, used, created_at, used_at
            FROM {}
            WHERE token_hash = $1
              AND used = FALSE
              AND expires_at > $2
            "#,
            kind.table()
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|r| r.into_token(kind)))
    }

    async fn mark_used(&self, kind: TokenKind, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET used = TRUE, used_at = $2
            WHERE id = $1
              AND used = FALSE
            "#,
            kind.table()
        ))
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_before(&self, kind: TokenKind, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE expires_at < $1",
            kind.table()
        ))
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
