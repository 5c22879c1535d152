//! Server-rendered pages for the cookie flow.
//!
//! Pages reuse the same credential checks as the JSON API; only the transport
//! differs. Every guarded page resolves the session cookie first and falls
//! back to a redirect to `/login`, never to an error page.

use axum::{
    extract::{Extension, Form},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use super::auth::{
    login::{authenticate, LoginOutcome, INVALID_CREDENTIALS_MESSAGE, LOGIN_FAILED_MESSAGE},
    password,
    register::{DUPLICATE_IDENTITY_MESSAGE, REGISTRATION_FAILED_MESSAGE},
    session::{
        clear_session_cookie, extract_session_reference, session_cookie, SessionRecord,
        SessionStore,
    },
    storage::{find_by_id, insert_user, RegisterOutcome},
    token::{unix_now, TokenService},
};
use super::entries::{insert_entry, list_entries};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub content: String,
    pub entry_date: Option<NaiveDate>,
}

/// Resolve the session cookie to an active session, if any.
fn page_session(headers: &HeaderMap, sessions: &SessionStore) -> Option<SessionRecord> {
    let reference = extract_session_reference(headers)?;
    sessions.resolve(&reference)
}

pub async fn index(
    headers: HeaderMap,
    sessions: Extension<Arc<SessionStore>>,
) -> Redirect {
    if page_session(&headers, &sessions).is_some() {
        Redirect::to("/diary")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_form() -> Html<String> {
    Html(render_login(None))
}

#[instrument(skip_all)]
pub async fn login_submit(
    pool: Extension<PgPool>,
    tokens: Extension<Arc<TokenService>>,
    sessions: Extension<Arc<SessionStore>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match authenticate(&pool, &tokens, &form.username, &form.password, unix_now()).await {
        Ok(LoginOutcome::Success { user_id, token }) => {
            let reference = match sessions.start(user_id, token) {
                Ok(reference) => reference,
                Err(err) => {
                    error!("Failed to start session: {err}");
                    return Html(render_login(Some(LOGIN_FAILED_MESSAGE))).into_response();
                }
            };
            let Ok(cookie) = session_cookie(&reference) else {
                error!("session reference produced an invalid cookie");
                return Html(render_login(Some(LOGIN_FAILED_MESSAGE))).into_response();
            };
            ([(SET_COOKIE, cookie)], Redirect::to("/diary")).into_response()
        }
        Ok(LoginOutcome::Rejected) => {
            Html(render_login(Some(INVALID_CREDENTIALS_MESSAGE))).into_response()
        }
        Err(err) => {
            error!("Login failed: {err}");
            Html(render_login(Some(LOGIN_FAILED_MESSAGE))).into_response()
        }
    }
}

pub async fn register_form() -> Html<String> {
    Html(render_register(None))
}

#[instrument(skip_all)]
pub async fn register_submit(
    pool: Extension<PgPool>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() || !super::valid_email(&form.email) {
        return Html(render_register(Some("Invalid username or email"))).into_response();
    }

    let digest = match password::hash(&form.password) {
        Ok(digest) => digest,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return Html(render_register(Some(REGISTRATION_FAILED_MESSAGE))).into_response();
        }
    };

    match insert_user(&pool, username, &form.email, &digest).await {
        Ok(RegisterOutcome::Created(_)) => Redirect::to("/login").into_response(),
        Ok(RegisterOutcome::Conflict) => {
            Html(render_register(Some(DUPLICATE_IDENTITY_MESSAGE))).into_response()
        }
        Err(err) => {
            error!("Failed to insert user: {err}");
            Html(render_register(Some(REGISTRATION_FAILED_MESSAGE))).into_response()
        }
    }
}

#[instrument(skip_all)]
pub async fn diary(
    headers: HeaderMap,
    sessions: Extension<Arc<SessionStore>>,
    pool: Extension<PgPool>,
) -> Response {
    let Some(session) = page_session(&headers, &sessions) else {
        return Redirect::to("/login").into_response();
    };

    let user = match find_by_id(&pool, session.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Account deleted while the session was alive.
            return Redirect::to("/login").into_response();
        }
        Err(err) => {
            error!("Failed to load user: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error())).into_response();
        }
    };

    match list_entries(&pool, session.user_id).await {
        Ok(entries) => {
            let rows = entries
                .iter()
                .map(|entry| {
                    format!(
                        "<li><strong>{}</strong> {}</li>",
                        entry.entry_date,
                        escape_html(&entry.content)
                    )
                })
                .collect::<String>();
            Html(render_diary(&user.username, &user.email, &rows)).into_response()
        }
        Err(err) => {
            error!("Failed to list entries: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error())).into_response()
        }
    }
}

#[instrument(skip_all)]
pub async fn add_entry(
    headers: HeaderMap,
    sessions: Extension<Arc<SessionStore>>,
    pool: Extension<PgPool>,
    Form(form): Form<EntryForm>,
) -> Response {
    let Some(session) = page_session(&headers, &sessions) else {
        return Redirect::to("/login").into_response();
    };

    let entry_date = form.entry_date.unwrap_or_else(|| Utc::now().date_naive());

    match insert_entry(&pool, session.user_id, &form.content, entry_date).await {
        Ok(()) => Redirect::to("/diary").into_response(),
        Err(err) => {
            error!("Failed to insert entry: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error())).into_response()
        }
    }
}

pub async fn logout(headers: HeaderMap, sessions: Extension<Arc<SessionStore>>) -> Response {
    if let Some(reference) = extract_session_reference(&headers) {
        sessions.end(&reference);
    }

    match clear_session_cookie() {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to("/login")).into_response(),
        Err(_) => Redirect::to("/login").into_response(),
    }
}

/// Escape the five HTML-significant characters; user content is interpolated
/// into markup nowhere else.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body>\n{body}\n</body>\n</html>"
    )
}

fn render_flash(message: Option<&str>) -> String {
    message.map_or_else(String::new, |message| {
        format!("<p class=\"flash\">{}</p>", escape_html(message))
    })
}

fn render_login(flash: Option<&str>) -> String {
    let body = format!(
        "<h1>Login</h1>\n{}\
         <form method=\"post\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Login</button>\n\
         </form>\n\
         <p>No account? <a href=\"/register\">Register</a></p>",
        render_flash(flash)
    );
    render_page("Login", &body)
}

fn render_register(flash: Option<&str>) -> String {
    let body = format!(
        "<h1>Register</h1>\n{}\
         <form method=\"post\" action=\"/register\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"email\" type=\"email\" placeholder=\"Email\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Register</button>\n\
         </form>\n\
         <p>Have an account? <a href=\"/login\">Login</a></p>",
        render_flash(flash)
    );
    render_page("Register", &body)
}

fn render_diary(username: &str, email: &str, entry_rows: &str) -> String {
    let body = format!(
        "<h1>{}'s diary</h1>\n\
         <p>{}</p>\n\
         <form method=\"post\" action=\"/entry\">\n\
         <textarea name=\"content\" required></textarea>\n\
         <input name=\"entry_date\" type=\"date\">\n\
         <button type=\"submit\">Add entry</button>\n\
         </form>\n\
         <ul>{entry_rows}</ul>\n\
         <p><a href=\"/logout\">Logout</a></p>",
        escape_html(username),
        escape_html(email)
    );
    render_page("Diary", &body)
}

fn render_error() -> String {
    render_page("Error", "<h1>Something went wrong</h1>")
}
