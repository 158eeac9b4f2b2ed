//! HTTP API handlers for lumen-api
//!
//! Every `/api/*` route runs behind the auth middleware and sees the caller
//! as an `AuthUser` extension. `/health` is public.

pub mod bulk;
pub mod flashlights;
pub mod health;
pub mod references;
pub mod session;
pub mod stats;

pub use bulk::bulk_routes;
pub use flashlights::flashlight_routes;
pub use health::health_routes;
pub use references::reference_routes;
pub use session::session_routes;
pub use stats::stats_routes;

use axum::body::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// Parse a request body as JSON, rejecting malformed input with 400
pub(crate) fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))
}

/// Parse an id path segment, rejecting malformed ids with 400
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}
