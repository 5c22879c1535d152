//! Database helpers for credential state.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(i64),
    /// Username or email already taken.
    Conflict,
}

/// Credential row as stored; `password_hash` never leaves this layer except
/// into the verifier.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Insert a new user. Uniqueness of username and email is enforced by the
/// database constraints in the same statement, so two concurrent
/// registrations can never both succeed.
///
/// # Errors
///
/// Returns an error for storage failures other than a uniqueness violation.
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<RegisterOutcome> {
    let query = "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegisterOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Look up a user for login.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<UserRecord>> {
    let query = "SELECT id, username, email, password_hash FROM users WHERE username = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }))
}

/// Look up a user by id (diary page).
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRecord>> {
    let query = "SELECT id, username, email, password_hash FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
