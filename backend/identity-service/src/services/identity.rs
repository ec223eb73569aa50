//! Identity flows: register, confirm, login, forgot/reset password, profile
//! and role management
//!
//! Each flow is a sequence of single-document writes with no cross-entity
//! transaction. A flow cancelled between awaits keeps the writes it already
//! committed (e.g. an account whose confirmation token was never issued).

use crate::config::{Settings, DEFAULT_PASSWORD_MIN_LENGTH, DEFAULT_PUBLIC_BASE_URL};
use crate::db::AccountRepository;
use crate::error::{IdentityError, Result};
use crate::models::{normalize_email, Account, AccountProfile, NewAccount, TokenKind};
use crate::security::{hash_password, validate_password_policy, verify_password, Clock};
use crate::services::email::{EmailSender, EmailTemplates};
use crate::services::token_manager::TokenManager;
use chrono::{DateTime, Utc};
use crypto_core::{JwtCodec, CLAIM_CAN_POST, ROLE_USER};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(max = 100))]
    #[serde(default, alias = "fullName")]
    pub display_name: Option<String>,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub account: AccountProfile,
    /// False when the confirmation email could not be handed off
    pub email_dispatched: bool,
}

#[derive(Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub account_id: Uuid,
    pub email: String,
}

#[derive(Clone, Deserialize)]
pub struct ResetPasswordInput {
    pub token: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 100))]
    #[serde(default, alias = "fullName")]
    pub display_name: Option<String>,
}

/// Policy knobs taken from [`Settings`]
#[derive(Debug, Clone)]
pub struct IdentityOptions {
    pub public_base_url: String,
    pub password_min_length: usize,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
        }
    }
}

impl From<&Settings> for IdentityOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            public_base_url: settings.public_base_url.clone(),
            password_min_length: settings.password_min_length,
        }
    }
}

#[derive(Clone)]
pub struct IdentityService {
    accounts: Arc<dyn AccountRepository>,
    tokens: TokenManager,
    codec: Arc<JwtCodec>,
    email: Arc<dyn EmailSender>,
    templates: EmailTemplates,
    clock: Arc<dyn Clock>,
    password_min_length: usize,
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await?
}

impl IdentityService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: TokenManager,
        codec: Arc<JwtCodec>,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        options: IdentityOptions,
    ) -> Self {
        Self {
            accounts,
            tokens,
            codec,
            email,
            templates: EmailTemplates::new(options.public_base_url),
            clock,
            password_min_length: options.password_min_length,
        }
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Create an unconfirmed account and send its confirmation link
    ///
    /// Succeeds even if the email hand-off fails; the outcome reports it.
    pub async fn register(&self, mut input: RegisterInput) -> Result<RegistrationOutcome> {
        input.email = input.email.trim().to_string();
        input.validate().map_err(|e| {
            if e.field_errors().contains_key("email") {
                IdentityError::InvalidEmail(input.email.clone())
            } else {
                IdentityError::from(e)
            }
        })?;
        validate_password_policy(&input.password, self.password_min_length)?;

        let email = input.email;
        let normalized_email = normalize_email(&email);
        if self
            .accounts
            .find_by_normalized_email(&normalized_email)
            .await?
            .is_some()
        {
            return Err(IdentityError::EmailAlreadyExists);
        }

        let password_hash = hash_blocking(input.password).await?;
        let display_name = input
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        // Concurrent registrations are settled by the store's unique index
        let account = self
            .accounts
            .insert(
                NewAccount {
                    email,
                    normalized_email,
                    password_hash,
                    display_name,
                    roles: BTreeSet::from([ROLE_USER.to_string()]),
                    claims: BTreeMap::from([(CLAIM_CAN_POST.to_string(), "true".to_string())]),
                },
                self.clock.now(),
            )
            .await?;
        info!(account_id = %account.id, "Account registered");

        let issued = self.tokens.issue_email_confirmation_token(account.id).await?;
        let greeting = account.display_name.as_deref().unwrap_or(&account.email);
        let (subject, body) = self.templates.confirmation_email(greeting, &issued.raw);

        let email_dispatched = match self.email.send(&account.email, subject, &body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Failed to send confirmation email");
                false
            }
        };

        Ok(RegistrationOutcome {
            account: account.profile(),
            email_dispatched,
        })
    }

    pub async fn confirm_email(&self, token: &str) -> Result<()> {
        let resolved = self
            .tokens
            .resolve_valid_token(TokenKind::EmailConfirmation, token)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        let mut account = self
            .accounts
            .find_by_id(resolved.account_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        account.email_confirmed = true;
        account.updated_at = Some(self.clock.now());
        self.accounts.replace(&account).await?;
        self.consume(&resolved).await?;

        info!(account_id = %account.id, "Email confirmed");
        Ok(())
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome> {
        let Some(account) = self
            .accounts
            .find_by_normalized_email(&normalize_email(&input.email))
            .await?
        else {
            debug!("Login for unknown email");
            return Err(IdentityError::InvalidCredentials);
        };

        if !account.email_confirmed {
            return Err(IdentityError::EmailNotConfirmed);
        }

        if !verify_blocking(input.password, account.password_hash.clone()).await? {
            debug!(account_id = %account.id, "Login with wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        let issued = self
            .codec
            .issue_at(account.token_request(), self.clock.now())?;
        info!(account_id = %account.id, "Access token issued");

        Ok(LoginOutcome {
            access_token: issued.token,
            expires_at: issued.expires_at,
            account_id: account.id,
            email: account.email,
        })
    }

    /// Issue and send a reset link; unknown emails succeed silently
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let Some(account) = self
            .accounts
            .find_by_normalized_email(&normalize_email(email))
            .await?
        else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let issued = self.tokens.issue_password_reset_token(account.id).await?;
        let (subject, body) = self.templates.password_reset_email(&issued.raw);

        if let Err(e) = self.email.send(&account.email, subject, &body).await {
            warn!(account_id = %account.id, error = %e, "Failed to send password reset email");
        }
        Ok(())
    }

    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<()> {
        validate_password_policy(&input.new_password, self.password_min_length)?;

        let resolved = self
            .tokens
            .resolve_valid_token(TokenKind::PasswordReset, &input.token)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        let mut account = self
            .accounts
            .find_by_id(resolved.account_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        account.password_hash = hash_blocking(input.new_password).await?;
        account.updated_at = Some(self.clock.now());
        self.accounts.replace(&account).await?;
        self.consume(&resolved).await?;

        info!(account_id = %account.id, "Password reset");
        Ok(())
    }

    pub async fn get_profile(&self, account_id: Uuid) -> Result<AccountProfile> {
        Ok(self.load(account_id).await?.profile())
    }

    /// Set the display name; a missing or blank value leaves it unchanged
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<AccountProfile> {
        input.validate()?;
        let mut account = self.load(account_id).await?;

        if let Some(name) = input
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
        {
            account.display_name = Some(name);
            account.updated_at = Some(self.clock.now());
            self.accounts.replace(&account).await?;
        }

        Ok(account.profile())
    }

    /// Add a role label; granting a held role is a no-op
    pub async fn grant_role(&self, account_id: Uuid, role: &str) -> Result<AccountProfile> {
        let role = role.trim();
        if role.is_empty() {
            return Err(IdentityError::Validation("role must not be empty".into()));
        }

        let mut account = self.load(account_id).await?;
        if account.roles.insert(role.to_string()) {
            account.updated_at = Some(self.clock.now());
            self.accounts.replace(&account).await?;
            info!(%account_id, role, "Role granted");
        }

        Ok(account.profile())
    }

    async fn load(&self, account_id: Uuid) -> Result<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }

    async fn consume(&self, token: &crate::models::EphemeralToken) -> Result<()> {
        if !self.tokens.consume_token(token).await? {
            warn!(
                token_id = %token.id,
                kind = %token.kind,
                "Token was already consumed by a concurrent redemption"
            );
        }
        Ok(())
    }
}
