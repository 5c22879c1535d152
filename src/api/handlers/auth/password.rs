//! Password hashing primitive.
//!
//! Argon2id with a fresh random salt per call; the digest is a
//! self-describing PHC string, so verification needs no extra state.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

/// Hash a plaintext password. Two calls with the same input yield different
/// digests (random salt), both verifiable.
///
/// # Errors
///
/// Returns an error if the underlying KDF fails.
pub fn hash(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
}

/// Verify a plaintext password against a stored digest.
///
/// A malformed digest verifies as `false` rather than erroring; the caller
/// only ever learns match / no match.
#[must_use]
pub fn verify(plaintext: &str, digest: &str) -> bool {
    PasswordHash::new(digest)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let digest = hash("pw1").expect("hash");
        assert!(verify("pw1", &digest));
        assert!(!verify("pw2", &digest));
    }

    #[test]
    fn test_salted_digests_differ_but_both_verify() {
        let first = hash("pw1").expect("hash");
        let second = hash("pw1").expect("hash");
        assert_ne!(first, second);
        assert!(verify("pw1", &first));
        assert!(verify("pw1", &second));
    }

    #[test]
    fn test_malformed_digest_is_false_not_error() {
        assert!(!verify("pw1", ""));
        assert!(!verify("pw1", "not-a-phc-string"));
        assert!(!verify("pw1", "$argon2id$v=19$truncated"));
    }

    #[test]
    fn test_empty_password_still_round_trips() {
        let digest = hash("").expect("hash");
        assert!(verify("", &digest));
        assert!(!verify("x", &digest));
    }
}
