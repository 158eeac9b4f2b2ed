//! Bulk import endpoint

use axum::{body::Bytes, extract::State, routing::post, Extension, Json, Router};
use lumen_common::api::BulkImportResponse;
use serde_json::{json, Value};

use super::parse_json_body;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{BulkImporter, BulkOptions};
use crate::AppState;

/// POST /api/flashlights/bulk
///
/// **Request:** `{"flashlights": [ ... ]}`
/// **Response:** 200 with per-item results, even when every item failed to store
///
/// **Errors:**
/// - 400 Bad Request: body is not JSON, has no `flashlights` array, or any
///   item is malformed (`details` lists `{index, field, message}` per item;
///   nothing is written)
pub async fn bulk_import(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<Json<BulkImportResponse>> {
    let envelope = parse_json_body(&body)?;

    let Some(items) = envelope.get("flashlights").and_then(Value::as_array) else {
        return Err(ApiError::BadRequestDetails {
            message: "Invalid data format".to_string(),
            details: json!([{ "field": "flashlights", "message": "must be an array" }]),
        });
    };

    let options = BulkOptions::from_config(&state.config.import);
    let mut importer = BulkImporter::new(&state.db, user_id, options);

    importer
        .import(items)
        .await
        .map(Json)
        .map_err(|invalid| ApiError::BadRequestDetails {
            message: "Invalid data format".to_string(),
            details: json!(invalid),
        })
}

/// Build bulk import routes
pub fn bulk_routes() -> Router<AppState> {
    Router::new().route("/api/flashlights/bulk", post(bulk_import))
}
