/// Password reset token generation and digesting
///
/// A reset token is 32 bytes from the thread-local CSPRNG, hex-encoded into a
/// 64-character string. Only the token's SHA-256 digest is stored on the user
/// record; the plaintext travels to the user by mail and back in the reset
/// request, where it is digested again for lookup.
///
/// # Example
///
/// ```
/// use freelacrm_shared::auth::reset_token::{digest_reset_token, generate_reset_token};
///
/// let (token, digest) = generate_reset_token();
/// assert_eq!(token.len(), 64);
/// assert_eq!(digest_reset_token(&token), digest);
/// ```

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a reset token
const TOKEN_BYTES: usize = 32;

/// How long a reset token is accepted after issue
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Generates a new reset token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_digest)
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let digest = digest_reset_token(&token);

    (token, digest)
}

/// SHA-256 digest of a reset token, hex-encoded
pub fn digest_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `token` has the shape of a generated reset token
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_reset_token() {
        let (token, digest) = generate_reset_token();

        assert_eq!(token.len(), 64);
        assert!(is_well_formed(&token));
        assert_eq!(digest.len(), 64);
        assert_ne!(token, digest);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_reset_token().0).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let (token, digest) = generate_reset_token();
        assert_eq!(digest_reset_token(&token), digest);
        assert_ne!(digest_reset_token(&format!("{token}0")), digest);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            digest_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_is_well_formed() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("xyz"));
        assert!(!is_well_formed(&"g".repeat(64)));
        assert!(is_well_formed(&"a".repeat(64)));
    }

    #[test]
    fn test_ttl_is_one_hour() {
        assert_eq!(reset_token_ttl(), Duration::seconds(3600));
    }
}
