//! Shared API request/response types
//!
//! Record input accepted by the service, the bulk import envelope and
//! response, and the common error envelope. The service reads request
//! bodies into these types; the migration client sends them.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{EmitterColor, FlashlightStatus, ShippingStatus};

// ========================================
// Record input
// ========================================

/// Bulk import envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportRequest {
    pub flashlights: Vec<FlashlightInput>,
}

/// Flashlight as submitted for create, update or bulk import
///
/// Omitted and null fields take their defaults. Required text, positive
/// counts and the shipping-status default are checked by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashlightInput {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_name: Option<String>,
    /// Older spelling of `manufacturer_name`, which wins when both are sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub finish: String,
    #[serde(deserialize_with = "null_as_default")]
    pub finish_group: String,
    #[serde(deserialize_with = "null_as_default")]
    pub battery_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub emitters: Vec<EmitterInput>,
    #[serde(deserialize_with = "null_as_default")]
    pub driver: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ui: String,
    #[serde(deserialize_with = "null_as_default")]
    pub anduril: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub form_factors: Vec<String>,
    pub ip_rating: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub special_features: Vec<String>,
    pub notes: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub purchase_date: String,
    pub status: Option<FlashlightStatus>,
    pub shipping_status: Option<ShippingStatus>,
}

/// One emitter of a submitted flashlight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterInput {
    #[serde(rename = "type")]
    pub emitter_type: Option<String>,
    /// `"5000K"` or a bare number of kelvin
    #[serde(deserialize_with = "cct_text")]
    pub cct: Option<String>,
    pub count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub color: EmitterColor,
}

/// Edit of one stored emitter
///
/// Outer `None` means the key was absent; `Some(None)` means an explicit null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterPatchInput {
    #[serde(
        rename = "type",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub emitter_type: Option<Option<String>>,
    #[serde(deserialize_with = "present_cct", skip_serializing_if = "Option::is_none")]
    pub cct: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<EmitterColor>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn cct_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(kelvin)) => Ok(Some(kelvin.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "invalid type: {}, expected a string or number",
            other
        ))),
    }
}

fn present_cct<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    cct_text(deserializer).map(Some)
}

// ========================================
// Bulk import response
// ========================================

/// Bulk import result
///
/// `summary.successful + summary.failed == summary.total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportResponse {
    pub message: String,
    pub summary: BulkSummary,
    pub results: BulkResults,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResults {
    pub successful: Vec<BulkSuccess>,
    pub failed: Vec<BulkFailure>,
}

/// Item stored successfully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSuccess {
    pub model: String,
    pub manufacturer: String,
    pub id: Uuid,
}

/// Item rejected or not stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub model: String,
    pub manufacturer: String,
    pub error: String,
}

impl BulkImportResponse {
    /// Assemble a response, deriving the summary from the results
    pub fn from_results(results: BulkResults) -> Self {
        Self {
            message: "Bulk import completed".to_string(),
            summary: BulkSummary {
                total: results.successful.len() + results.failed.len(),
                successful: results.successful.len(),
                failed: results.failed.len(),
            },
            results,
        }
    }
}

// ========================================
// Error envelope
// ========================================

/// Error response body: `{"error": {"code", "message", "details"?}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code (e.g. `VALIDATION_ERROR`)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        let mut response = Self::new(code, message);
        response.error.details = Some(details);
        response
    }
}

// ========================================
// Tests
// ========================================
