//! Reference table listings and the fixed vocabulary

use axum::{extract::State, routing::get, Json, Router};
use lumen_common::catalog::{BATTERY_TYPES, FINISH_GROUPS, FORM_FACTORS, IP_RATINGS};
use lumen_common::{EmitterColor, FlashlightStatus, ShippingStatus};
use serde::Serialize;

use crate::db::list_references;
use crate::error::ApiResult;
use crate::models::ReferenceRow;
use crate::services::ReferenceKind;
use crate::AppState;

/// GET /api/manufacturers
pub async fn list_manufacturers(State(state): State<AppState>) -> ApiResult<Json<Vec<ReferenceRow>>> {
    Ok(Json(list_references(&state.db, ReferenceKind::Manufacturer).await?))
}

/// GET /api/emitter-types
pub async fn list_emitter_types(State(state): State<AppState>) -> ApiResult<Json<Vec<ReferenceRow>>> {
    Ok(Json(list_references(&state.db, ReferenceKind::EmitterType).await?))
}

/// Accepted enum values plus suggested free-text values, for input forms
#[derive(Debug, Serialize)]
pub struct Vocabulary {
    pub statuses: &'static [FlashlightStatus],
    pub shipping_statuses: &'static [ShippingStatus],
    pub emitter_colors: &'static [EmitterColor],
    pub form_factors: &'static [&'static str],
    pub ip_ratings: &'static [&'static str],
    pub battery_types: &'static [&'static str],
    pub finish_groups: &'static [&'static str],
}

/// GET /api/vocabulary
pub async fn get_vocabulary() -> Json<Vocabulary> {
    Json(Vocabulary {
        statuses: FlashlightStatus::ALL,
        shipping_statuses: ShippingStatus::ALL,
        emitter_colors: EmitterColor::ALL,
        form_factors: FORM_FACTORS,
        ip_ratings: IP_RATINGS,
        battery_types: BATTERY_TYPES,
        finish_groups: FINISH_GROUPS,
    })
}

pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/api/manufacturers", get(list_manufacturers))
        .route("/api/emitter-types", get(list_emitter_types))
        .route("/api/vocabulary", get(get_vocabulary))
}
