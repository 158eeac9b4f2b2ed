//! Legacy record normalization
//!
//! The legacy list carries older enum spellings: the five-state status set
//! (`NEW`, `ACTIVE`, `STORAGE`, `GIFTED`, `RETIRED`), `"In Transit"` for
//! shipped items, and misspelled manufacturer names. All of it is mapped
//! onto the current vocabulary here, before anything is sent.

use lumen_common::api::{EmitterInput, FlashlightInput};
use lumen_common::catalog::{canonical_manufacturer, legacy_shipping_status, legacy_status};
use lumen_common::{EmitterColor, FlashlightStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Legacy record that cannot be mapped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("unrecognized status '{0}'")]
    UnknownStatus(String),

    #[error("unrecognized emitter color '{0}'")]
    UnknownColor(String),
}

/// Flashlight as exported from the legacy collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyFlashlight {
    pub model: String,
    pub manufacturer: String,
    pub finish: String,
    pub finish_group: String,
    pub battery_type: String,
    pub emitters: Vec<LegacyEmitter>,
    pub driver: String,
    pub ui: String,
    pub anduril: bool,
    pub form_factors: Vec<String>,
    pub ip_rating: Option<String>,
    pub special_features: Vec<String>,
    pub notes: Option<String>,
    pub purchase_date: String,
    pub status: String,
    pub shipping_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyEmitter {
    #[serde(rename = "type", default)]
    pub emitter_type: String,
    /// Either `"5000K"` or a bare number
    #[serde(default)]
    pub cct: Option<Value>,
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_count() -> i64 {
    1
}

/// Map a legacy record onto a bulk import item
pub fn transform(light: &LegacyFlashlight) -> Result<FlashlightInput, TransformError> {
    let status = legacy_status(&light.status)
        .ok_or_else(|| TransformError::UnknownStatus(light.status.clone()))?;

    // Only items in hand keep a dispatch state
    let shipping_status = match status {
        FlashlightStatus::Owned => light
            .shipping_status
            .as_deref()
            .and_then(legacy_shipping_status),
        _ => None,
    };

    let emitters = light
        .emitters
        .iter()
        .map(transform_emitter)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FlashlightInput {
        model: light.model.trim().to_string(),
        manufacturer_name: Some(canonical_manufacturer(&light.manufacturer).to_string()),
        manufacturer: None,
        finish: light.finish.clone(),
        finish_group: light.finish_group.clone(),
        battery_type: light.battery_type.clone(),
        emitters,
        driver: light.driver.clone(),
        ui: light.ui.clone(),
        anduril: light.anduril,
        form_factors: light.form_factors.clone(),
        ip_rating: non_blank(&light.ip_rating),
        special_features: light.special_features.clone(),
        notes: non_blank(&light.notes),
        purchase_date: light.purchase_date.clone(),
        status: Some(status),
        shipping_status,
    })
}

fn transform_emitter(emitter: &LegacyEmitter) -> Result<EmitterInput, TransformError> {
    let color = match emitter.color.as_deref().map(str::trim) {
        None | Some("") => EmitterColor::White,
        Some(label) => legacy_color(label).ok_or_else(|| TransformError::UnknownColor(label.to_string()))?,
    };

    let cct = match &emitter.cct {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let emitter_type = Some(emitter.emitter_type.trim())
        .filter(|label| !label.is_empty())
        .map(str::to_string);

    Ok(EmitterInput {
        emitter_type,
        cct,
        count: emitter.count,
        color,
    })
}

/// Accept current wire strings and the legacy enum keys
fn legacy_color(label: &str) -> Option<EmitterColor> {
    if let Ok(color) = label.parse::<EmitterColor>() {
        return Some(color);
    }
    match label.to_ascii_uppercase().as_str() {
        "WHITE" => Some(EmitterColor::White),
        "RED" => Some(EmitterColor::Red),
        "GREEN" => Some(EmitterColor::Green),
        "BLUE" => Some(EmitterColor::Blue),
        "LASER_GREEN" => Some(EmitterColor::GreenLaser),
        "LASER_RED" => Some(EmitterColor::RedLaser),
        _ => None,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
