//! Single-flashlight CRUD endpoints
//!
//! Each request runs the same pipeline as a bulk item (compose, resolve,
//! write) with a request-scoped resolver. Unknown manufacturers and emitter
//! types are created on demand.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{parse_id, parse_json_body};
use crate::auth::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::Flashlight;
use crate::services::{compose_emitter_patch, compose_flashlight, RecordWriter, ReferenceResolver};
use crate::AppState;

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/flashlights
///
/// Caller's flashlights with emitters, newest first.
pub async fn list_flashlights(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Flashlight>>> {
    Ok(Json(db::list_flashlights(&state.db, user_id).await?))
}

/// GET /api/flashlights/:id
pub async fn get_flashlight(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Flashlight>> {
    let id = parse_id(&id, "flashlight")?;

    db::load_flashlight(&state.db, user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Flashlight not found".to_string()))
}

/// POST /api/flashlights
///
/// **Response:** 201 with the stored record (server-assigned ids and timestamps)
pub async fn create_flashlight(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Flashlight>)> {
    let input = parse_json_body(&body)?;
    let draft = compose_flashlight(&input)?;

    let mut resolver = ReferenceResolver::new();
    let stored = RecordWriter::new(&state.db)
        .create(&mut resolver, user_id, &draft)
        .await?;

    info!(flashlight = %stored.id, model = %stored.model, "Created flashlight");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /api/flashlights/:id
///
/// Supplied fields are merged over the stored record, then the result is
/// validated as a whole. Emitters are replaced only when the body carries an
/// `emitters` key (`[]` or `null` clears them).
pub async fn update_flashlight(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Flashlight>> {
    let id = parse_id(&id, "flashlight")?;
    let Value::Object(changes) = parse_json_body(&body)? else {
        return Err(ApiError::BadRequest("Request body must be a JSON object".to_string()));
    };

    let existing = db::load_flashlight(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flashlight not found".to_string()))?;

    let Ok(Value::Object(mut merged)) = serde_json::to_value(existing.to_input()) else {
        return Err(ApiError::Internal("Stored record did not render as an object".to_string()));
    };

    // `manufacturer` alone must win over the stored `manufacturer_name`
    if changes.contains_key("manufacturer") && !changes.contains_key("manufacturer_name") {
        merged.remove("manufacturer_name");
    }

    let replace_emitters = changes.contains_key("emitters");
    merged.extend(changes);

    let draft = compose_flashlight(&Value::Object(merged))?;

    let mut resolver = ReferenceResolver::new();
    let stored = RecordWriter::new(&state.db)
        .update(&mut resolver, user_id, id, &draft, replace_emitters)
        .await?;

    info!(flashlight = %id, replace_emitters, "Updated flashlight");
    Ok(Json(stored))
}

/// DELETE /api/flashlights/:id
pub async fn delete_flashlight(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "flashlight")?;

    RecordWriter::new(&state.db).delete(user_id, id).await?;

    info!(flashlight = %id, "Deleted flashlight");
    Ok(Json(MessageResponse {
        message: "Flashlight deleted successfully".to_string(),
    }))
}

/// PATCH /api/flashlights/:id/emitters/:emitter_id
///
/// **Request:** any of `type`, `cct`, `count`, `color`
/// **Response:** the owning flashlight, as stored after the edit
pub async fn patch_emitter(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path((id, emitter_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Flashlight>> {
    let id = parse_id(&id, "flashlight")?;
    let emitter_id = parse_id(&emitter_id, "emitter")?;
    let patch = compose_emitter_patch(&parse_json_body(&body)?)?;

    let mut resolver = ReferenceResolver::new();
    let stored = RecordWriter::new(&state.db)
        .patch_emitter(&mut resolver, user_id, id, emitter_id, &patch)
        .await?;

    Ok(Json(stored))
}

/// Build flashlight routes
pub fn flashlight_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flashlights", get(list_flashlights).post(create_flashlight))
        .route(
            "/api/flashlights/:id",
            get(get_flashlight).put(update_flashlight).delete(delete_flashlight),
        )
        .route("/api/flashlights/:id/emitters/:emitter_id", patch(patch_emitter))
}
