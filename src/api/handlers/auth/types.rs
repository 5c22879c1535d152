//! Request/response types for the JSON auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The `{status, message}` envelope shared by register/login outcomes.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
    pub user_id: i64,
}

impl LoginResponse {
    #[must_use]
    pub fn new(token: String, user_id: i64) -> Self {
        Self {
            status: "success".to_string(),
            token,
            user_id,
        }
    }
}
