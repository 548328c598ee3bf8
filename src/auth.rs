//! Viewer authentication and GraphQL context plumbing.
//!
//! Provides helpers for:
//! - Extracting the signed viewer cookie and anti-CSRF header
//! - Authorizing requests against the stored session token
//! - Collecting cookie writes issued by resolvers
//! - The Axum handler that wires all of it into a GraphQL execution

use std::sync::Arc;

use async_graphql::{Request, Response};
use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::http::AppState;
use crate::loaders::Loaders;
use crate::models::User;
use crate::store::Database;

/// Name of the signed cookie holding the viewer id.
pub const VIEWER_COOKIE: &str = "viewer";

/// Header carrying the session token on authorized requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Extract the session token from the X-CSRF-TOKEN header.
pub fn extract_csrf_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// What a request presented to identify its viewer.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub viewer: Option<String>,
    pub csrf_token: Option<String>,
}

impl Credentials {
    pub fn from_request(jar: &SignedCookieJar, headers: &HeaderMap) -> Self {
        Self {
            viewer: jar.get(VIEWER_COOKIE).map(|c| c.value().to_string()),
            csrf_token: extract_csrf_token(headers),
        }
    }
}

/// Generate a fresh session token for a logged-in viewer.
pub fn session_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Look up the viewer a request acts on behalf of.
///
/// A viewer is authorized only when the signed cookie id resolves to a
/// user whose stored session token matches the X-CSRF-TOKEN header.
/// Anything less yields `None` rather than an error; mutations that
/// cannot proceed anonymously use [`require_viewer`].
pub fn authorize(db: &Database, credentials: &Credentials) -> AppResult<Option<User>> {
    let Some(viewer_id) = credentials.viewer.as_deref() else {
        return Ok(None);
    };
    let Some(token) = credentials.csrf_token.as_deref() else {
        return Ok(None);
    };
    Ok(db.users.get(viewer_id)?.filter(|user| user.token == token))
}

/// Authorize the request or fail with an unauthorized error.
pub fn require_viewer(db: &Database, credentials: &Credentials) -> AppResult<User> {
    authorize(db, credentials)?
        .ok_or_else(|| AppError::Unauthorized("viewer cannot be found".to_string()))
}

/// A cookie write requested by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieOp {
    SetViewer(String),
    ClearViewer,
}

/// Collects cookie writes during GraphQL execution.
///
/// Resolvers cannot touch the response headers directly, so log-in and
/// log-out push their cookie changes here and the handler applies them
/// to the jar once execution finishes.
#[derive(Clone, Default)]
pub struct CookieSink {
    ops: Arc<Mutex<Vec<CookieOp>>>,
}

impl CookieSink {
    pub async fn set_viewer(&self, id: String) {
        self.ops.lock().await.push(CookieOp::SetViewer(id));
    }

    pub async fn clear_viewer(&self) {
        self.ops.lock().await.push(CookieOp::ClearViewer);
    }

    pub async fn take(&self) -> Vec<CookieOp> {
        std::mem::take(&mut *self.ops.lock().await)
    }
}

/// Build the long-lived viewer cookie.
fn viewer_cookie(id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((VIEWER_COOKIE, id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .permanent()
        .build()
}

/// Apply queued cookie writes to the response jar.
pub fn apply_cookie_ops(jar: SignedCookieJar, ops: Vec<CookieOp>, secure: bool) -> SignedCookieJar {
    ops.into_iter().fold(jar, |jar, op| match op {
        CookieOp::SetViewer(id) => jar.add(viewer_cookie(&id, secure)),
        CookieOp::ClearViewer => jar.remove(Cookie::build(VIEWER_COOKIE).path("/").build()),
    })
}

/// GraphQL handler with per-request loader and credential injection.
///
/// Builds a fresh [`Loaders`] set for the request, extracts credentials
/// from the signed jar and headers, executes the query, and applies any
/// cookie writes the resolvers queued.
pub async fn graphql_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    req: Json<Request>,
) -> (SignedCookieJar, Json<Response>) {
    let credentials = Credentials::from_request(&jar, &headers);
    let cookies = CookieSink::default();

    let request = req
        .0
        .data(Loaders::new(&state.db))
        .data(credentials)
        .data(cookies.clone());

    let response = state.schema.execute(request).await;

    let jar = apply_cookie_ops(jar, cookies.take().await, state.config.secure_cookies);
    (jar, Json(response))
}
