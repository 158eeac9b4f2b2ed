//! API module for shared HTTP API functionality
//!
//! Provides credential handling and the request/response types shared by the
//! lumen service and its clients.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Database operations (via sqlx)
//! - Shared types
//!
//! The service wraps these with framework-specific middleware (Axum).

pub mod auth;
pub mod types;

pub use auth::{
    create_session, find_api_token, find_session, generate_token, hash_token, issue_api_token,
    revoke_session, CredentialRecord,
};
pub use types::{
    BulkFailure, BulkImportRequest, BulkImportResponse, BulkResults, BulkSuccess, BulkSummary,
    EmitterInput, EmitterPatchInput, ErrorBody, ErrorResponse, FlashlightInput,
};
