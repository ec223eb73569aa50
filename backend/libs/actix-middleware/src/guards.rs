//! Role and claim checks for authenticated callers

use crate::jwt_auth::{AuthError, AuthenticatedUser};
pub use crypto_core::{CLAIM_CAN_POST, ROLE_ADMIN};

impl AuthenticatedUser {
    pub fn require_role(&self, role: &str) -> Result<(), AuthError> {
        if self.claims.has_role(role) {
            Ok(())
        } else {
            tracing::debug!(account_id = %self.account_id, role, "Missing required role");
            Err(AuthError::Forbidden(format!("role '{}' required", role)))
        }
    }

    pub fn require_claim(&self, key: &str, value: &str) -> Result<(), AuthError> {
        if self.claims.has_claim(key, value) {
            Ok(())
        } else {
            tracing::debug!(account_id = %self.account_id, claim = key, "Missing required claim");
            Err(AuthError::Forbidden(format!("claim '{}' required", key)))
        }
    }

    /// Content writes are gated by the `CanPost` claim
    pub fn require_can_post(&self) -> Result<(), AuthError> {
        self.require_claim(CLAIM_CAN_POST, "true")
    }
}
