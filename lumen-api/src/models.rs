//! Flashlight and emitter records
//!
//! `Flashlight`/`Emitter` are records as stored (server-assigned ids and
//! timestamps, resolved reference names). `FlashlightDraft`/`EmitterDraft`
//! are validated input awaiting reference resolution and persistence.

use chrono::{DateTime, Utc};
use lumen_common::api::{EmitterInput, FlashlightInput};
use lumen_common::{EmitterColor, FlashlightStatus, ShippingStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored flashlight with its emitters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashlight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub model: String,
    pub manufacturer_id: i64,
    /// Manufacturer name resolved from `manufacturer_id`
    pub manufacturer: String,
    pub finish: String,
    pub finish_group: String,
    pub battery_type: String,
    pub driver: String,
    pub ui: String,
    /// Advanced (Anduril) firmware
    pub anduril: bool,
    pub form_factors: Vec<String>,
    pub ip_rating: Option<String>,
    pub special_features: Vec<String>,
    pub notes: Option<String>,
    pub purchase_date: String,
    pub status: FlashlightStatus,
    pub shipping_status: Option<ShippingStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered as supplied at write time
    pub emitters: Vec<Emitter>,
}

/// Stored emitter, exclusively owned by one flashlight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emitter {
    pub id: Uuid,
    pub flashlight_id: Uuid,
    pub emitter_type_id: Option<i64>,
    /// Reference name, or the free-text label when no reference exists
    #[serde(rename = "type")]
    pub emitter_type: Option<String>,
    /// Correlated color temperature; null for non-white colors
    pub cct: Option<String>,
    pub count: i64,
    pub color: EmitterColor,
    pub created_at: DateTime<Utc>,
}

impl Flashlight {
    /// Render as record input, the shape accepted by create/update
    ///
    /// Used to merge a partial update over the stored record.
    pub fn to_input(&self) -> FlashlightInput {
        FlashlightInput {
            model: self.model.clone(),
            manufacturer_name: Some(self.manufacturer.clone()),
            manufacturer: None,
            finish: self.finish.clone(),
            finish_group: self.finish_group.clone(),
            battery_type: self.battery_type.clone(),
            emitters: self
                .emitters
                .iter()
                .map(|e| EmitterInput {
                    emitter_type: e.emitter_type.clone(),
                    cct: e.cct.clone(),
                    count: e.count,
                    color: e.color,
                })
                .collect(),
            driver: self.driver.clone(),
            ui: self.ui.clone(),
            anduril: self.anduril,
            form_factors: self.form_factors.clone(),
            ip_rating: self.ip_rating.clone(),
            special_features: self.special_features.clone(),
            notes: self.notes.clone(),
            purchase_date: self.purchase_date.clone(),
            status: Some(self.status),
            shipping_status: self.shipping_status,
        }
    }
}

/// Validated flashlight input (references still unresolved)
#[derive(Debug, Clone, PartialEq)]
pub struct FlashlightDraft {
    pub model: String,
    /// Manufacturer label to resolve (non-empty)
    pub manufacturer: String,
    pub finish: String,
    pub finish_group: String,
    pub battery_type: String,
    pub driver: String,
    pub ui: String,
    pub anduril: bool,
    pub form_factors: Vec<String>,
    pub ip_rating: Option<String>,
    pub special_features: Vec<String>,
    pub notes: Option<String>,
    pub purchase_date: String,
    pub status: FlashlightStatus,
    pub shipping_status: Option<ShippingStatus>,
    pub emitters: Vec<EmitterDraft>,
}

/// Validated emitter input
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterDraft {
    /// Emitter-type label; `None` stores no reference
    pub type_label: Option<String>,
    pub cct: Option<String>,
    /// Always >= 1 when produced by the composer
    pub count: i64,
    pub color: EmitterColor,
}

/// Partial emitter edit
///
/// Outer `None` leaves a field unchanged; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitterPatch {
    pub type_label: Option<Option<String>>,
    pub cct: Option<Option<String>>,
    pub count: Option<i64>,
    pub color: Option<EmitterColor>,
}

impl EmitterPatch {
    pub fn is_empty(&self) -> bool {
        self.type_label.is_none() && self.cct.is_none() && self.count.is_none() && self.color.is_none()
    }
}

/// Shared reference row (manufacturer or emitter type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub id: i64,
    pub name: String,
}
