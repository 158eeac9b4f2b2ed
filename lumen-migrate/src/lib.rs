//! lumen-migrate - moves a legacy flashlight list into a lumen-api instance
//!
//! Legacy records are normalized through the canonical catalog, then posted
//! to the bulk import endpoint in chunks.

pub mod client;
pub mod legacy;

pub use client::{MigrationClient, MigrationError, MigrationTotals};
pub use legacy::{transform, LegacyEmitter, LegacyFlashlight, TransformError};
