/// Password hashing and verification using Argon2id
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Longest accepted password; bounds hashing cost for hostile input
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using Argon2id
///
/// ## Security
///
/// - Algorithm: Argon2id (default configuration)
/// - Salt: random per password
///
/// Returns a PHC-formatted hash string safe for database storage. CPU-bound:
/// async callers should run it on the blocking pool.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Comparison is constant-time. A mismatch is `Ok(false)`, a malformed hash
/// is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Enforce the configured length policy
pub fn validate_password_policy(password: &str, min_length: usize) -> Result<()> {
    let length = password.chars().count();
    if length < min_length {
        return Err(IdentityError::WeakPassword(format!(
            "must be at least {} characters",
            min_length
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword(format!(
            "must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("pw1").unwrap();
        let b = hash_password("pw1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_policy_min_length() {
        assert!(validate_password_policy("12345678", 8).is_ok());
        assert!(matches!(
            validate_password_policy("1234567", 8),
            Err(IdentityError::WeakPassword(_))
        ));
        assert!(validate_password_policy(&"x".repeat(129), 8).is_err());
    }
}
