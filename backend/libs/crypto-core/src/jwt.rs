/// Access-token codec for the blog backend
///
/// Issues and verifies short-lived, self-contained bearer credentials.
/// Verification is pure: it needs the shared secret and nothing else, so any
/// request handler can authenticate a caller without touching storage.
///
/// ## Security Design
///
/// - **HS256 ONLY**: a single symmetric secret signs and verifies. Switching
///   algorithms is a breaking change for every outstanding token.
/// - **No global key cells**: the codec is an owned value injected where it is
///   needed, so tests can run codecs with different secrets side by side.
/// - **Strict validation**: issuer, audience, signature, `exp` and `nbf` are all
///   checked, with a configurable clock-skew leeway (default 30 seconds).
///
/// ## Wire format
///
/// Compact JWS (`header.payload.signature`). The payload carries the registered
/// claims plus `email`, `uid`, `roles` and one top-level string claim per custom
/// account claim.
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// JWT algorithm - tokens are not self-describing across algorithms
pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length in bytes (256 bits for HMAC-SHA-256)
pub const MIN_SECRET_BYTES: usize = 32;

pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;
pub const DEFAULT_CLOCK_SKEW_SECONDS: u64 = 30;

/// Role every new account starts with
pub const ROLE_USER: &str = "User";
/// Role allowed to grant roles to other accounts
pub const ROLE_ADMIN: &str = "Admin";
/// Custom claim (value `"true"`) that permits content writes
pub const CLAIM_CAN_POST: &str = "CanPost";

/// Claim names owned by the codec. Custom account claims may not reuse them.
const RESERVED_CLAIMS: &[&str] = &[
    "sub", "email", "uid", "roles", "iss", "aud", "iat", "nbf", "exp", "jti",
];

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret must be at least {0} bytes")]
    WeakSecret(usize),

    #[error("Failed to generate access token: {0}")]
    Signing(String),

    #[error("Token validation failed: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, JwtError>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_minutes: i64,
    pub clock_skew_seconds: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_minutes", &self.access_token_minutes)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims - registered claims plus blog-specific identity fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Flattened copy of `sub`, read by handlers that only know "uid"
    pub uid: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Custom account claims, one top-level string claim each
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl Claims {
    pub fn subject_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.uid)
            .map_err(|e| JwtError::Invalid(format!("malformed uid claim: {e}")))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_claim(&self, key: &str, value: &str) -> bool {
        self.custom.get(key).is_some_and(|v| v == value)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Identity material needed to mint an access token
#[derive(Debug, Clone, Copy)]
pub struct AccessTokenRequest<'a> {
    pub subject_id: Uuid,
    pub email: &'a str,
    pub roles: &'a BTreeSet<String>,
    pub claims: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Codec
// ============================================================================

#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec").field("config", &self.config).finish()
    }
}

impl JwtCodec {
    /// Build a codec from configuration
    ///
    /// ## Errors
    ///
    /// Returns `JwtError::WeakSecret` if the secret is shorter than 32 bytes.
    pub fn new(config: JwtConfig) -> Result<Self> {
        if config.secret.len() < MIN_SECRET_BYTES {
            return Err(JwtError::WeakSecret(MIN_SECRET_BYTES));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = config.clock_skew_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn access_token_lifetime(&self) -> Duration {
        Duration::minutes(self.config.access_token_minutes)
    }

    /// Issue an access token valid from now for the configured lifetime
    pub fn issue(&self, request: AccessTokenRequest<'_>) -> Result<IssuedAccessToken> {
        self.issue_at(request, Utc::now())
    }

    /// Issue an access token as if the current time were `now`
    pub fn issue_at(
        &self,
        request: AccessTokenRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<IssuedAccessToken> {
        let expires_at = now + self.access_token_lifetime();
        let subject = request.subject_id.to_string();

        let mut custom = BTreeMap::new();
        for (key, value) in request.claims {
            if RESERVED_CLAIMS.contains(&key.as_str()) {
                warn!(
                    account_id = %request.subject_id,
                    claim = %key,
                    "Skipping custom claim that collides with a registered claim"
                );
                continue;
            }
            custom.insert(key.clone(), value.clone());
        }

        let claims = Claims {
            sub: subject.clone(),
            email: request.email.to_string(),
            uid: subject,
            roles: request.roles.iter().cloned().collect(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            custom,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))?;

        Ok(IssuedAccessToken { token, expires_at })
    }

    /// Validate and decode an access token
    ///
    /// Rejects on signature, issuer, audience, expiry or not-before mismatch
    /// (all time checks honour the configured leeway).
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::Invalid(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
