//! JWT session tokens and the cookie that carries them.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// Name of the HTTP-only cookie holding the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Sessions last seven days.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// The caller identity established from a valid session token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid user id in session token: {0}")]
    InvalidSubject(#[from] uuid::Error),
}

/// Signs and verifies session tokens and builds the session cookies.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secure_cookies: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, secure_cookies: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            secure_cookies,
        }
    }

    /// Issues an HS256 token for `user`, valid for [`SESSION_TTL_SECS`].
    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now as u64,
            exp: (now + SESSION_TTL_SECS) as u64,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Checks signature and expiry and returns the identity in the token.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, SessionError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        let user_id = Uuid::parse_str(&data.claims.sub)?;
        Ok(AuthenticatedUser {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    /// The cookie that stores a freshly issued token.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((AUTH_COOKIE, token))
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(SESSION_TTL_SECS))
            .build()
    }

    /// An already-expired session cookie that makes the browser drop its copy.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((AUTH_COOKIE, ""))
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        cookie.make_removal();
        cookie
    }
}

/// Finds the session token in the `auth_token` cookie or, failing that, in a
/// `Bearer` authorization header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}
