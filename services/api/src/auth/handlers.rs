//! Registration, login, logout and current-user endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    password::{hash_password, normalize_email, validate_credentials, verify_password},
    sessions::token_from_headers,
};
use crate::{
    db::StoreError,
    handlers::ApiError,
    models::{CurrentUserResponse, ErrorResponse, LoginPayload, RegisterPayload, UserResponse},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created; session cookie set", body = UserResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    let email = normalize_email(&payload.email);
    validate_credentials(&email, &payload.password)
        .map_err(|message| ApiError::BadRequest(message.to_string()))?;

    info!(%email, role = %payload.role, "Registering new user.");
    let password_hash = hash_password(payload.password, state.config.password_hash_cost).await?;

    let user = state
        .store
        .create_user(&email, &password_hash, payload.role)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => {
                warn!(%email, "Registration rejected: email already registered.");
                ApiError::Conflict("Email is already registered.".to_string())
            }
            other => ApiError::InternalServerError(other.into()),
        })?;

    let token = state.sessions.issue(&user)?;
    info!(user_id = %user.id, "Registration complete. Session issued.");

    Ok((
        StatusCode::CREATED,
        jar.add(state.sessions.session_cookie(token)),
        Json(UserResponse::from(&user)),
    ))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = UserResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required.".to_string(),
        ));
    }

    info!(%email, "Login attempt.");
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(%email, "Login failed: unknown email.");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        warn!(%email, "Login failed: wrong password.");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.sessions.issue(&user)?;
    info!(user_id = %user.id, "Login successful.");

    Ok((
        jar.add(state.sessions.session_cookie(token)),
        Json(UserResponse::from(&user)),
    ))
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cookie cleared"))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    info!("Logout requested.");
    (
        jar.add(state.sessions.removal_cookie()),
        Json(json!({ "success": true })),
    )
}

/// Describe the caller, or return a null user for anonymous callers.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Current user or null", body = CurrentUserResponse))
)]
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<CurrentUserResponse> {
    let Some(identity) = token_from_headers(&headers).and_then(|token| {
        state
            .sessions
            .verify(&token)
            .map_err(|e| debug!(error = %e, "Ignoring invalid session token."))
            .ok()
    }) else {
        return Json(CurrentUserResponse { user: None });
    };

    let user = match state.store.find_user_by_id(identity.user_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = ?e, "Failed to load current user.");
            None
        }
    };

    Json(CurrentUserResponse {
        user: user.as_ref().map(UserResponse::from),
    })
}
