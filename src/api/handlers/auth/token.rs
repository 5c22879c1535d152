//! Stateless bearer tokens (HS256 JWT).
//!
//! A token is valid iff its signature verifies against the process-wide
//! secret and the expiry claim is still in the future. There is no
//! server-side record and no revocation; expiry is the only lifecycle.
//!
//! The current time is an explicit parameter on [`TokenService::issue`] and
//! [`TokenService::validate`] so expiry behavior is testable with a fixed
//! clock.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

/// Tokens expire 24 hours after issuance.
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Owner user id.
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Why validation failed. Callers outside this module log the cause and
/// surface a single undifferentiated message to clients.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Current unix time, for the call sites that do not simulate a clock.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Issues and validates signed bearer tokens against a process-wide secret.
#[derive(Debug, Clone)]
pub struct TokenService {
    secret: SecretString,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<Hmac<Sha256>, Error> {
        Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| Error::InvalidKey)
    }

    /// Create a signed token for `user_id`, expiring [`TOKEN_TTL_SECONDS`]
    /// after `now_unix_seconds`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded or signing fails.
    pub fn issue(&self, user_id: i64, now_unix_seconds: i64) -> Result<String, Error> {
        let claims = Claims {
            sub: user_id,
            iat: now_unix_seconds,
            exp: now_unix_seconds + TOKEN_TTL_SECONDS,
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Validate a token and return its subject user id.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed or contains invalid base64/json,
    /// - the algorithm is not HS256,
    /// - the signature does not verify (checked before the claims are
    ///   decoded, so tampered payloads never reach the JSON parser),
    /// - the token is expired (`exp <= now_unix_seconds`).
    pub fn validate(&self, token: &str, now_unix_seconds: i64) -> Result<i64, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        // Mac::verify_slice is a constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: Claims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(Error::Expired);
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixed clock so expiry assertions are deterministic.
    const NOW: i64 = 1_700_000_000;

    fn service() -> TokenService {
        TokenService::new(SecretString::from("my_secret_key_12345".to_string()))
    }

    #[test]
    fn test_round_trip() -> Result<(), Error> {
        let tokens = service();
        let token = tokens.issue(42, NOW)?;
        assert_eq!(tokens.validate(&token, NOW)?, 42);
        // still valid one second before the deadline
        assert_eq!(tokens.validate(&token, NOW + TOKEN_TTL_SECONDS - 1)?, 42);
        Ok(())
    }

    #[test]
    fn test_expired_at_deadline() -> Result<(), Error> {
        let tokens = service();
        let token = tokens.issue(42, NOW)?;
        assert!(matches!(
            tokens.validate(&token, NOW + TOKEN_TTL_SECONDS),
            Err(Error::Expired)
        ));
        assert!(matches!(
            tokens.validate(&token, NOW + TOKEN_TTL_SECONDS + 1),
            Err(Error::Expired)
        ));
        Ok(())
    }

    #[test]
    fn test_wrong_secret_rejected() -> Result<(), Error> {
        let token = service().issue(42, NOW)?;
        let other = TokenService::new(SecretString::from("other_secret".to_string()));
        assert!(matches!(
            other.validate(&token, NOW),
            Err(Error::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn test_tampering_any_byte_invalidates() -> Result<(), Error> {
        let tokens = service();
        let token = tokens.issue(42, NOW)?;

        for index in 0..token.len() {
            let mut tampered = token.clone().into_bytes();
            tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered).expect("ascii");
            if tampered == token {
                continue;
            }
            assert!(
                tokens.validate(&tampered, NOW).is_err(),
                "tampered byte {index} was accepted"
            );
        }
        Ok(())
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service();
        assert!(matches!(
            tokens.validate("", NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            tokens.validate("only-one-part", NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            tokens.validate("a.b", NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            tokens.validate("a.b.c.d", NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            tokens.validate("!!.b.c", NOW),
            Err(Error::Base64)
        ));
    }

    #[test]
    fn test_unsupported_algorithm() -> Result<(), Error> {
        let tokens = service();
        let header_b64 = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let claims_b64 = b64e_json(&Claims {
            sub: 42,
            iat: NOW,
            exp: NOW + TOKEN_TTL_SECONDS,
        })?;
        let token = format!("{header_b64}.{claims_b64}.");
        assert!(matches!(
            tokens.validate(&token, NOW),
            Err(Error::UnsupportedAlg(alg)) if alg == "none"
        ));
        Ok(())
    }

    #[test]
    fn test_missing_claim_rejected() -> Result<(), Error> {
        let tokens = service();

        // Correctly signed payload that lacks the exp claim.
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 =
            Base64UrlUnpadded::encode_string(br#"{"sub":42,"iat":1700000000}"#);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = tokens.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        let token = format!("{signing_input}.{signature_b64}");

        assert!(matches!(tokens.validate(&token, NOW), Err(Error::Json(_))));
        Ok(())
    }
}
