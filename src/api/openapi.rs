use utoipa::OpenApi;

use crate::api::handlers::{auth, entries, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::login::login,
        entries::create_entry,
        entries::entries,
    ),
    components(schemas(
        auth::types::RegisterRequest,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::StatusResponse,
        entries::Entry,
        entries::EntryRequest,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "entries", description = "Owner-scoped diary entries"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
