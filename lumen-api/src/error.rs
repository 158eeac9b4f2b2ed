//! Error types for lumen-api
//!
//! `ValidationError` and `ImportError` describe failures of the record
//! pipeline (compose, resolve, write). `ApiError` maps them, and every other
//! handler failure, onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lumen_common::api::ErrorResponse;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::services::ReferenceKind;

/// Malformed or missing input field
///
/// Always recoverable by the caller correcting the input; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid field '{field}': {message}")]
pub struct ValidationError {
    /// Field path, e.g. `status` or `emitters[1].count`
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Record pipeline failure
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Label has no reference row and the caller forbade creating one
    #[error("Unknown {kind}: {label}")]
    UnknownReference { kind: ReferenceKind, label: String },

    /// Reference read failed for a reason other than "not found"
    #[error("Failed to look up {kind} '{label}': {reason}")]
    LookupFailed {
        kind: ReferenceKind,
        label: String,
        reason: String,
    },

    /// Reference creation failed, after one re-fetch on conflict
    #[error("Failed to create {kind} '{label}': {reason}")]
    CreateFailed {
        kind: ReferenceKind,
        label: String,
        reason: String,
    },

    /// Parent or child persistence failed; the transaction was rolled back
    #[error("Failed to write flashlight: {0}")]
    WriteFailed(String),

    #[error("{0}")]
    NotFound(String),

    /// Read-back or other storage failure outside the write transaction
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Invalid request with structured details (400)
    #[error("Invalid request: {message}")]
    BadRequestDetails {
        message: String,
        details: serde_json::Value,
    },

    /// Field-level validation failure (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or rejected credential (401)
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// lumen-common error
    #[error("Common error: {0}")]
    Common(#[from] lumen_common::Error),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let message = err.to_string();
        match err {
            ImportError::Validation(e) => ApiError::Validation(e),
            ImportError::UnknownReference { .. } => ApiError::BadRequest(message),
            ImportError::NotFound(msg) => ApiError::NotFound(msg),
            ImportError::Storage(e) => ApiError::Database(e),
            ImportError::LookupFailed { .. }
            | ImportError::CreateFailed { .. }
            | ImportError::WriteFailed(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::NotFound(msg) => {
                return respond(StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", msg.clone()))
            }
            ApiError::BadRequest(msg) => ErrorResponse::new("BAD_REQUEST", msg.clone()),
            ApiError::BadRequestDetails { message, details } => {
                ErrorResponse::with_details("BAD_REQUEST", message.clone(), details.clone())
            }
            ApiError::Validation(e) => ErrorResponse::with_details(
                "VALIDATION_ERROR",
                e.to_string(),
                json!({ "field": e.field, "message": e.message }),
            ),
            ApiError::Auth(e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    error!("Authentication backend failure: {}", e);
                }
                return respond(status, ErrorResponse::new(e.code(), e.to_string()));
            }
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Common(_) => {
                error!("Request failed: {}", self);
                return respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", self.to_string()),
                );
            }
        };

        respond(StatusCode::BAD_REQUEST, body)
    }
}

fn respond(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
