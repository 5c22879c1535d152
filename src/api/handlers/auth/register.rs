use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use super::{
    password,
    storage::{insert_user, RegisterOutcome},
    types::{RegisterRequest, StatusResponse},
};
use crate::api::handlers::valid_email;

pub const DUPLICATE_IDENTITY_MESSAGE: &str = "Username or email already exists!";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed!";

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration outcome", body = StatusResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed payload", body = StatusResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Missing payload")),
        );
    };

    let username = request.username.trim();
    if username.is_empty() || !valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Invalid username or email")),
        );
    }

    // The plaintext stops here; only the digest is persisted.
    let digest = match password::hash(&request.password) {
        Ok(digest) => digest,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::OK,
                Json(StatusResponse::error(REGISTRATION_FAILED_MESSAGE)),
            );
        }
    };

    match insert_user(&pool, username, &request.email, &digest).await {
        Ok(RegisterOutcome::Created(user_id)) => {
            debug!("registered user {user_id}");
            (StatusCode::OK, Json(StatusResponse::success()))
        }
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::OK,
            Json(StatusResponse::error(DUPLICATE_IDENTITY_MESSAGE)),
        ),
        Err(err) => {
            error!("Failed to insert user: {err}");
            (
                StatusCode::OK,
                Json(StatusResponse::error(REGISTRATION_FAILED_MESSAGE)),
            )
        }
    }
}
