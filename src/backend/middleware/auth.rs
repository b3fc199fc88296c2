/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require
 * user authentication. It extracts the JWT from the `Authorization: Bearer`
 * header (or the `token` cookie), verifies it, and attaches the user to the
 * request extensions. The socket gateway reuses the same extraction and
 * verification before upgrading.
 */

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::SessionKeys;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Name of the cookie that may carry the session token
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated user data extracted from JWT token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

impl AuthenticatedUser {
    /// Name shown to other users when nothing better is known
    pub fn fallback_name(&self) -> String {
        match &self.username {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ if !self.email.is_empty() => self.email.clone(),
            _ => "Unknown user".to_string(),
        }
    }
}

/// Bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Token from the `token` cookie
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Header token, preferring `Authorization` over the cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// Verify `token` and build the authenticated user
pub fn authenticate(keys: &SessionKeys, token: &str) -> Result<AuthenticatedUser, BackendError> {
    let claims = keys.verify_token(token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
        tracing::warn!("Invalid user ID in token: {:?}", e);
        BackendError::unauthorized("Invalid token subject")
    })?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
        username: claims.username,
    })
}

/// Authentication middleware
///
/// Returns 401 when the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = token_from_headers(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing bearer token");
        BackendError::unauthorized("Access token required")
    })?;

    let user = authenticate(&app_state.keys, &token)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Axum extractor for authenticated user
///
/// Use as a handler parameter on routes behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Access token required")
            })?;

        Ok(AuthUser(user))
    }
}
