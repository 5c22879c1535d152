//! # Diaria
//!
//! `diaria` is a personal-diary web backend. It keeps per-user diary entries
//! behind a small authentication core:
//!
//! - **Credentials** are stored as Argon2id digests; usernames and emails are
//!   unique at the database level.
//! - **Bearer tokens** (HS256, 24h expiry) guard the JSON API.
//! - **Cookie sessions** guard the HTML pages; both resolve to the same
//!   authenticated user id before any entry is read or written.
//!
//! Login failures are deliberately undifferentiated: an unknown username and
//! a wrong password produce the same response, so accounts cannot be
//! enumerated through the login endpoint.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
