//! HTTP Basic authentication against the users table.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use thiserror::Error;

use crate::api::response::ApiError;
use crate::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing error: {0}")]
    Hashing(String),
}

/// The authenticated caller. Only the auth middleware creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(String);

impl CurrentUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[derive(Debug, PartialEq)]
struct BasicCredentials {
    username: String,
    password: String,
}

/// Parse an `Authorization: Basic <base64(user:password)>` header value.
fn parse_basic_credentials(value: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Middleware: authenticate the request and attach the `CurrentUser`.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_credentials)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = state
        .db
        .get_user(&credentials.username)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let Some(user) = user else {
        tracing::warn!(user = %credentials.username, "Unknown user");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let valid = verify_password(&credentials.password, &user.password_hash)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !valid {
        tracing::warn!(user = %credentials.username, "Invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    req.extensions_mut().insert(CurrentUser::new(user.username));
    Ok(next.run(req).await)
}

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("Task join error: {e}")))?
}

/// Verify a password against a bcrypt hash on the blocking pool.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("Task join error: {e}")))?
}
