use sqlx::PgPool;
use tracing::info;

use crate::error::Result;
use crate::models::TokenKind;

/// Ensure account and token tables exist.
///
/// Created lazily at startup so fresh environments work without a separate
/// migration step. Every statement is idempotent.
pub async fn ensure_identity_tables(pool: &PgPool) -> Result<()> {
    info!("Ensuring identity tables exist");

    sqlx::query(ACCOUNTS_TABLE).execute(pool).await?;
    sqlx::query(ACCOUNTS_EMAIL_INDEX).execute(pool).await?;

    for kind in [TokenKind::EmailConfirmation, TokenKind::PasswordReset] {
        let table = kind.table();
        sqlx::query(&token_table_ddl(table)).execute(pool).await?;
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_hash ON {table} (token_hash)"
        ))
        .execute(pool)
        .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_expires ON {table} (expires_at)"
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

const ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL,
    normalized_email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    display_name TEXT,
    roles TEXT[] NOT NULL DEFAULT '{}',
    claims JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
)
"#;

const ACCOUNTS_EMAIL_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_normalized_email ON accounts (normalized_email)";

fn token_table_ddl(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    token_hash TEXT NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    used BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    used_at TIMESTAMPTZ
)
"#
    )
}
