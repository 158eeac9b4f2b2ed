//! # Lumen Common Library
//!
//! Shared code for the lumen service and its tooling:
//! - Canonical catalog of enumerated domain values
//! - Database schema and initialization
//! - Credential hashing and token issuance
//! - API request/response types
//! - Configuration loading

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;

pub use catalog::{EmitterColor, FlashlightStatus, ShippingStatus};
pub use error::{Error, Result};
