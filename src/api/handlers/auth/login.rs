use anyhow::Result;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    password,
    storage::find_by_username,
    token::{unix_now, TokenService},
    types::{LoginRequest, LoginResponse, StatusResponse},
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials!";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed!";

/// Outcome of credential verification. There is exactly one rejection
/// variant: unknown usernames and wrong passwords are indistinguishable to
/// callers, so accounts cannot be enumerated.
#[derive(Debug)]
pub enum LoginOutcome {
    Success { user_id: i64, token: String },
    Rejected,
}

/// Verify credentials and, on success, issue a bearer token. Shared by the
/// JSON endpoint and the page login.
///
/// # Errors
///
/// Returns an error only for storage or signing failures, never for bad
/// credentials.
pub async fn authenticate(
    pool: &PgPool,
    tokens: &TokenService,
    username: &str,
    password_plaintext: &str,
    now_unix_seconds: i64,
) -> Result<LoginOutcome> {
    let Some(user) = find_by_username(pool, username).await? else {
        debug!("login rejected: unknown username");
        return Ok(LoginOutcome::Rejected);
    };

    if !password::verify(password_plaintext, &user.password_hash) {
        debug!("login rejected: password mismatch");
        return Ok(LoginOutcome::Rejected);
    }

    let token = tokens.issue(user.id, now_unix_seconds)?;

    Ok(LoginOutcome::Success {
        user_id: user.id,
        token,
    })
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login outcome; token and user_id on success", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed payload", body = StatusResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    tokens: Extension<Arc<TokenService>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Missing payload")),
        )
            .into_response();
    };

    match authenticate(
        &pool,
        &tokens,
        &request.username,
        &request.password,
        unix_now(),
    )
    .await
    {
        Ok(LoginOutcome::Success { user_id, token }) => {
            (StatusCode::OK, Json(LoginResponse::new(token, user_id))).into_response()
        }
        Ok(LoginOutcome::Rejected) => (
            StatusCode::OK,
            Json(StatusResponse::error(INVALID_CREDENTIALS_MESSAGE)),
        )
            .into_response(),
        Err(err) => {
            error!("Login failed: {err}");
            (
                StatusCode::OK,
                Json(StatusResponse::error(LOGIN_FAILED_MESSAGE)),
            )
                .into_response()
        }
    }
}
