//! Authentication middleware
//!
//! Applied to every `/api/*` route. `/health` does NOT use this middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::identity::{AuthError, Credential};
use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Resolve the caller's identity or reject with 401
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = extract_credential(request.headers(), &state.config.auth.session_cookie)?;

    let user_id = state
        .identity
        .authenticate(&credential)
        .await
        .map_err(|e| {
            warn!(path = %request.uri().path(), "Authentication failed: {}", e);
            e
        })?;

    debug!(user_id = %user_id, "Authenticated request");
    request.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(request).await)
}

/// Pick the credential from request headers
///
/// A bearer token wins over a cookie. An `Authorization` header with any
/// other scheme is rejected rather than falling through to the cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Result<Credential, AuthError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidToken)?;
        return Ok(Credential::Bearer(token.to_string()));
    }

    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=') {
                if name == cookie_name && !token.is_empty() {
                    return Ok(Credential::SessionCookie(token.to_string()));
                }
            }
        }
    }

    Err(AuthError::MissingCredential)
}
