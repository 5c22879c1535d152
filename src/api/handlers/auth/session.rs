//! Cookie-backed sessions for the page flow.
//!
//! The client holds an opaque random reference in an `HttpOnly` cookie; the
//! server keeps only its SHA-256 hash mapped to the owning user, so a leaked
//! store never exposes usable references. An ended session resolves to
//! nothing from that point on.
//!
//! The store is shared in-memory state: concurrent reads are safe, mutations
//! take the single writer lock.

use anyhow::{anyhow, Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::RwLock,
};

pub const SESSION_COOKIE_NAME: &str = "diaria_session";

/// Cookie lifetime; matches the bearer-token TTL.
pub const SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

/// What a valid session reference resolves to. The token issued at login is
/// kept alongside the user id so page flows can hand it to the browser.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Vec<u8>, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user_id` and return the raw reference for the
    /// cookie. Only the hash is kept server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if random generation fails or the store lock is
    /// poisoned.
    pub fn start(&self, user_id: i64, token: String) -> Result<String> {
        let reference = generate_session_reference()?;
        let key = hash_session_reference(&reference);

        let mut sessions = self
            .inner
            .write()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        sessions.insert(key, SessionRecord { user_id, token });

        Ok(reference)
    }

    /// Resolve a reference to the session that created it, if it is still
    /// active.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<SessionRecord> {
        let key = hash_session_reference(reference);
        self.inner.read().ok()?.get(&key).cloned()
    }

    /// End a session. Ending an unknown or already-ended reference is a
    /// no-op.
    pub fn end(&self, reference: &str) {
        let key = hash_session_reference(reference);
        if let Ok(mut sessions) = self.inner.write() {
            sessions.remove(&key);
        }
    }
}

/// Create a new session reference for the auth cookie.
fn generate_session_reference() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session reference")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session reference so raw values never sit in the store.
fn hash_session_reference(reference: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the `HttpOnly` cookie carrying the session reference.
///
/// # Errors
///
/// Returns an error if the reference contains bytes illegal in a header.
pub fn session_cookie(reference: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={reference}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECONDS}"
    ))
}

/// Cookie that expires the session reference client-side.
///
/// # Errors
///
/// Never fails in practice; kept fallible for symmetry with
/// [`session_cookie`].
pub fn clear_session_cookie() -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

/// Pull the session reference out of the `Cookie` header, if present.
#[must_use]
pub fn extract_session_reference(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}
