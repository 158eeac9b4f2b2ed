//! Collection statistics endpoint

use axum::{extract::State, routing::get, Extension, Json, Router};

use crate::auth::AuthUser;
use crate::db::{collection_stats, CollectionStats};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Json<CollectionStats>> {
    Ok(Json(collection_stats(&state.db, user_id).await?))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}
