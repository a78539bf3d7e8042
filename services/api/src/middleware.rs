//! Route Protection
//!
//! Requests under the protected path prefixes need a valid session. Browsers
//! without one are sent to the login page; other clients get a 401.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::ACCEPT, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    auth::sessions::{AuthenticatedUser, token_from_headers},
    handlers::ApiError,
    state::AppState,
};

/// Path prefixes that require a signed-in user.
pub const PROTECTED_PREFIXES: [&str; 4] = ["/chat", "/admin", "/courses", "/progress"];

pub const LOGIN_PATH: &str = "/login";

/// Whether `path` is one of the protected prefixes or lies below one.
pub fn is_protected_path(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn deny(headers: &HeaderMap, path: &str) -> Response {
    warn!(%path, "Access denied: no valid session.");
    if wants_html(headers) {
        Redirect::to(LOGIN_PATH).into_response()
    } else {
        ApiError::Unauthorized("Authentication required.".to_string()).into_response()
    }
}

/// Guards the protected prefixes and attaches the caller's identity.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_protected_path(&path) {
        return next.run(request).await;
    }

    let Some(identity) = token_from_headers(request.headers())
        .and_then(|token| state.sessions.verify(&token).ok())
    else {
        return deny(request.headers(), &path);
    };

    match state.store.find_user_by_id(identity.user_id).await {
        Ok(Some(_)) => {
            debug!(user_id = %identity.user_id, %path, "Session verified.");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(None) => {
            warn!(user_id = %identity.user_id, "Session refers to a deleted account.");
            deny(request.headers(), &path)
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the identity attached by [`require_session`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required.".to_string()))
    }
}
