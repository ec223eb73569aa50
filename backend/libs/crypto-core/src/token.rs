use rand::{distributions::Alphanumeric, Rng};

/// Length of opaque tokens handed out for email confirmation and password reset
pub const OPAQUE_TOKEN_LENGTH: usize = 32;

/// Generate an unguessable alphanumeric token (~190 bits of entropy)
pub fn generate_opaque_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OPAQUE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token() {
        let token = generate_opaque_token();
        assert_eq!(token.len(), OPAQUE_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_do_not_collide() {
        let tokens: HashSet<String> = (0..1_000).map(|_| generate_opaque_token()).collect();
        assert_eq!(tokens.len(), 1_000);
    }
}
