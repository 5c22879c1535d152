//! Owner-scoped diary entries.
//!
//! Every read and write goes through the owner id resolved by the auth
//! gateway; there is no path that accepts a user id from the request body.

use anyhow::{Context, Result};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::{error, instrument, Instrument};
use utoipa::ToSchema;

use super::auth::{gateway::Identity, types::StatusResponse};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Entry {
    pub id: i64,
    pub content: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntryRequest {
    pub content: String,
}

/// Insert an entry for `owner_id`.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_entry(
    pool: &PgPool,
    owner_id: i64,
    content: &str,
    entry_date: NaiveDate,
) -> Result<()> {
    let query = "INSERT INTO entries (user_id, content, entry_date) VALUES ($1, $2, $3)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(owner_id)
        .bind(content)
        .bind(entry_date)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert entry")?;

    Ok(())
}

/// List the entries owned by `owner_id`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_entries(pool: &PgPool, owner_id: i64) -> Result<Vec<Entry>> {
    let query = "SELECT id, content, entry_date, created_at FROM entries WHERE user_id = $1 ORDER BY created_at DESC";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(owner_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list entries")?;

    Ok(rows
        .into_iter()
        .map(|row| Entry {
            id: row.get("id"),
            content: row.get("content"),
            entry_date: row.get("entry_date"),
            created_at: row.get("created_at"),
        })
        .collect())
}

#[utoipa::path(
    post,
    path = "/api/entry",
    request_body = EntryRequest,
    params(
        ("Authorization" = String, Header, description = "Bearer token")
    ),
    responses(
        (status = 200, description = "Entry created", body = StatusResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed payload", body = StatusResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "entries"
)]
#[instrument(skip_all, fields(user_id = identity.user_id))]
pub async fn create_entry(
    identity: Identity,
    pool: Extension<PgPool>,
    payload: Option<Json<EntryRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("Missing payload")),
        );
    };

    let entry_date = Utc::now().date_naive();

    match insert_entry(&pool, identity.user_id, &request.content, entry_date).await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())),
        Err(err) => {
            error!("Failed to insert entry: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error("Failed to add entry")),
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/entries",
    params(
        ("Authorization" = String, Header, description = "Bearer token")
    ),
    responses(
        (status = 200, description = "Entries owned by the caller, newest first", body = [Entry], content_type = "application/json"),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "entries"
)]
#[instrument(skip_all, fields(user_id = identity.user_id))]
pub async fn entries(identity: Identity, pool: Extension<PgPool>) -> impl IntoResponse {
    match list_entries(&pool, identity.user_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => {
            error!("Failed to list entries: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error("Failed to load entries")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    #[test]
    fn test_entry_serialization_shape() -> Result<()> {
        let entry = Entry {
            id: 1,
            content: "dear diary".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("date"),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&entry)?;
        assert_eq!(value["id"], 1);
        assert_eq!(value["content"], "dear diary");
        assert_eq!(value["entry_date"], "2024-05-01");
        assert!(value["created_at"].as_str().expect("rfc3339").starts_with("2024-05-01T12:00:00"));
        Ok(())
    }
}
