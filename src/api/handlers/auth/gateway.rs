//! Bearer-token request guard for the JSON API.
//!
//! [`Identity`] is an extractor: a handler that takes it never runs without a
//! validated token, and the 401 response is emitted here, before any
//! owner-scoped data is touched. The two failure kinds are distinguished for
//! diagnostics but rendered with fixed messages so callers cannot probe
//! validation internals.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use super::token::{unix_now, TokenService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header at all.
    MissingToken,
    /// Malformed header shape, or a token that failed validation.
    InvalidToken,
}

impl AuthError {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Token is missing!",
            Self::InvalidToken => "Token is invalid!",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": self.message() })),
        )
            .into_response()
    }
}

/// Authenticated user context. Handlers must take the owner id from here and
/// from nowhere else in the request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i64,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// `MissingToken` when the header is absent, `InvalidToken` for any malformed
/// shape.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidToken)?;

    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().ok_or(AuthError::InvalidToken)?;

    if scheme != "Bearer" || token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let Some(tokens) = parts.extensions.get::<Arc<TokenService>>() else {
            error!("token service missing from request extensions");
            return Err(AuthError::InvalidToken);
        };

        match tokens.validate(token, unix_now()) {
            Ok(user_id) => Ok(Self { user_id }),
            Err(err) => {
                // The cause stays in the logs; the client sees one message.
                debug!("token rejected: {err}");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_malformed_shapes() {
        for value in ["Bearer", "Bearer ", "Token abc", "bearer abc", "abc"] {
            let headers = headers_with_authorization(value);
            assert_eq!(
                bearer_token(&headers),
                Err(AuthError::InvalidToken),
                "accepted malformed header {value:?}"
            );
        }
    }

    #[test]
    fn test_well_formed_header() {
        let headers = headers_with_authorization("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[tokio::test]
    async fn test_rejection_bodies_are_fixed() {
        for (err, expected) in [
            (AuthError::MissingToken, r#"{"message":"Token is missing!"}"#),
            (AuthError::InvalidToken, r#"{"message":"Token is invalid!"}"#),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            assert_eq!(body.as_ref(), expected.as_bytes());
        }
    }
}
