//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use notes_core::ports::PortError;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::web::{state::AppState, urls};

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session";

/// Pulls the auth session id out of the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// A `302 Found` pointing at `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, redirects to the login page with `next` pointing
/// back at the requested path; the handler never runs. A storage failure is a
/// server error, not a logout.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = match session_id_from_headers(req.headers()) {
        Some(session_id) => match state.accounts.validate_auth_session(session_id).await {
            Ok(user_id) => Some(user_id),
            Err(PortError::Unauthorized) => None,
            Err(e) => {
                error!("Failed to validate auth session: {:?}", e);
                return ApiError::from(e).into_response();
            }
        },
        None => None,
    };

    match user_id {
        Some(user_id) => {
            req.extensions_mut().insert(user_id);
            next.run(req).await
        }
        None => {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(urls::HOME);
            debug!("Anonymous request to {}, redirecting to login", target);
            found(&urls::login_with_next(target))
        }
    }
}
