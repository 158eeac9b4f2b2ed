//! Browser session endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use lumen_common::api::revoke_session;
use tracing::info;

use super::flashlights::MessageResponse;
use crate::auth::{extract_credential, Credential};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/logout
///
/// Revokes the caller's session and clears the cookie. API tokens are
/// long-lived and are not revoked here.
///
/// **Errors:**
/// - 400 Bad Request: the request authenticated with a bearer token
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let cookie_name = &state.config.auth.session_cookie;

    let Credential::SessionCookie(token) = extract_credential(&headers, cookie_name)? else {
        return Err(ApiError::BadRequest(
            "Only browser sessions can be logged out".to_string(),
        ));
    };

    let revoked = revoke_session(&state.db, &token).await?;
    info!(revoked, "Session logged out");

    let clear = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", cookie_name);
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear)]),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/logout", post(logout))
}
