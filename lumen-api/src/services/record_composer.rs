//! Record Composer
//!
//! Turns a raw JSON flashlight (or emitter patch) into validated drafts.
//! Shape and types come from the shared input types in `lumen_common::api`;
//! this module adds the checks serde cannot express. Pure: no storage
//! access. Every failure names the offending field path.

use lumen_common::api::{EmitterInput, EmitterPatchInput, FlashlightInput};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;

use crate::error::ValidationError;
use crate::models::{EmitterDraft, EmitterPatch, FlashlightDraft};

/// Compose a flashlight draft from client input
pub fn compose_flashlight(input: &Value) -> Result<FlashlightDraft, ValidationError> {
    let input: FlashlightInput = read_object(input, "flashlight")?;

    let status = input
        .status
        .ok_or_else(|| ValidationError::new("status", "is required"))?;
    let shipping_status = input
        .shipping_status
        .or_else(|| status.implied_shipping_status());

    let manufacturer = match (input.manufacturer_name, input.manufacturer) {
        (Some(name), _) => required_text("manufacturer_name", name)?,
        (None, Some(name)) => required_text("manufacturer", name)?,
        (None, None) => return Err(ValidationError::new("manufacturer_name", "is required")),
    };

    let emitters = input
        .emitters
        .into_iter()
        .enumerate()
        .map(|(i, emitter)| compose_emitter(i, emitter))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FlashlightDraft {
        model: required_text("model", input.model)?,
        manufacturer,
        finish: input.finish,
        finish_group: input.finish_group,
        battery_type: required_text("battery_type", input.battery_type)?,
        driver: input.driver,
        ui: input.ui,
        anduril: input.anduril,
        form_factors: non_blank_entries(input.form_factors),
        ip_rating: non_blank(input.ip_rating),
        special_features: non_blank_entries(input.special_features),
        notes: non_blank(input.notes),
        purchase_date: input.purchase_date,
        status,
        shipping_status,
        emitters,
    })
}

/// Compose an individual emitter edit
///
/// At least one of `type`, `cct`, `count`, `color` must be present.
pub fn compose_emitter_patch(input: &Value) -> Result<EmitterPatch, ValidationError> {
    let input: EmitterPatchInput = read_object(input, "emitter")?;

    if let Some(count) = input.count {
        positive_count("count", count)?;
    }

    let patch = EmitterPatch {
        type_label: input.emitter_type.map(non_blank),
        cct: input.cct.map(non_blank),
        count: input.count,
        color: input.color,
    };

    if patch.is_empty() {
        return Err(ValidationError::new(
            "emitter",
            "must contain at least one of: type, cct, count, color",
        ));
    }

    Ok(patch)
}

fn compose_emitter(index: usize, emitter: EmitterInput) -> Result<EmitterDraft, ValidationError> {
    Ok(EmitterDraft {
        type_label: non_blank(emitter.emitter_type),
        cct: non_blank(emitter.cct),
        count: positive_count(&format!("emitters[{}].count", index), emitter.count)?,
        color: emitter.color,
    })
}

/// Deserialize a JSON object, reporting the failing field path
fn read_object<T: DeserializeOwned>(value: &Value, root: &str) -> Result<T, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(root, "must be a JSON object"));
    }

    serde_path_to_error::deserialize(value).map_err(|err| {
        let field = field_path(err.path()).unwrap_or_else(|| root.to_string());
        ValidationError::new(field, err.into_inner().to_string())
    })
}

/// `emitters[1].count` style path; `None` at the root
fn field_path(path: &serde_path_to_error::Path) -> Option<String> {
    let mut out = String::new();
    for segment in path.iter() {
        if !out.is_empty() && !matches!(segment, Segment::Seq { .. }) {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    (!out.is_empty()).then_some(out)
}

fn required_text(field: &str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "is required"))
    } else {
        Ok(value)
    }
}

fn positive_count(field: &str, count: i64) -> Result<i64, ValidationError> {
    if count >= 1 {
        Ok(count)
    } else {
        Err(ValidationError::new(field, "must be a positive integer"))
    }
}

/// Blank text reads as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn non_blank_entries(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|s| !s.trim().is_empty()).collect()
}
