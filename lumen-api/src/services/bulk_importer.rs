//! Bulk Importer
//!
//! Composes every item of a batch first; if any item is malformed the batch
//! is rejected as a whole and nothing is written. Valid batches then run
//! Resolver → Writer one item at a time, sharing one resolver cache. A
//! store-time failure is recorded and the batch continues; the response
//! always accounts for every item.

use lumen_common::api::{BulkFailure, BulkImportResponse, BulkResults, BulkSuccess};
use lumen_common::config::ImportConfig;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ImportError;
use crate::models::{Flashlight, FlashlightDraft};
use crate::services::record_composer::compose_flashlight;
use crate::services::record_writer::RecordWriter;
use crate::services::reference_resolver::{MissingReference, ReferenceResolver};

/// Per-batch import policy
#[derive(Debug, Clone, Copy)]
pub struct BulkOptions {
    /// Policy for manufacturer labels with no reference row
    pub manufacturers: MissingReference,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            manufacturers: MissingReference::Reject,
        }
    }
}

impl BulkOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            manufacturers: if config.create_missing_manufacturers {
                MissingReference::Create
            } else {
                MissingReference::Reject
            },
        }
    }
}

/// Batch item that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidItem {
    /// Position in the submitted array
    pub index: usize,
    pub field: String,
    pub message: String,
}

/// Compose every item, collecting all validation failures
pub fn compose_batch(items: &[Value]) -> Result<Vec<FlashlightDraft>, Vec<InvalidItem>> {
    let mut drafts = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match compose_flashlight(item) {
            Ok(draft) => drafts.push(draft),
            Err(e) => invalid.push(InvalidItem {
                index,
                field: e.field,
                message: e.message,
            }),
        }
    }

    if invalid.is_empty() {
        Ok(drafts)
    } else {
        Err(invalid)
    }
}

/// Imports one batch for one user
pub struct BulkImporter<'a> {
    pool: &'a SqlitePool,
    user_id: Uuid,
    options: BulkOptions,
    resolver: ReferenceResolver,
}

impl<'a> BulkImporter<'a> {
    pub fn new(pool: &'a SqlitePool, user_id: Uuid, options: BulkOptions) -> Self {
        Self {
            pool,
            user_id,
            options,
            resolver: ReferenceResolver::new(),
        }
    }

    /// Validate the batch, then store every item in order
    ///
    /// Returns every invalid item, and writes nothing, if any item fails
    /// validation.
    pub async fn import(&mut self, items: &[Value]) -> Result<BulkImportResponse, Vec<InvalidItem>> {
        let drafts = compose_batch(items).map_err(|invalid| {
            warn!(
                user = %self.user_id,
                total = items.len(),
                invalid = invalid.len(),
                "Bulk import rejected"
            );
            invalid
        })?;

        Ok(self.store(&drafts).await)
    }

    /// Store validated drafts, recording per-item outcomes
    pub async fn store(&mut self, drafts: &[FlashlightDraft]) -> BulkImportResponse {
        let mut results = BulkResults::default();

        for (index, draft) in drafts.iter().enumerate() {
            match self.store_one(draft).await {
                Ok(stored) => {
                    results.successful.push(BulkSuccess {
                        model: stored.model,
                        manufacturer: stored.manufacturer,
                        id: stored.id,
                    });
                }
                Err(e) => {
                    warn!(
                        index,
                        model = %draft.model,
                        manufacturer = %draft.manufacturer,
                        "Bulk item failed: {}",
                        e
                    );
                    results.failed.push(BulkFailure {
                        model: draft.model.clone(),
                        manufacturer: draft.manufacturer.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            user = %self.user_id,
            total = drafts.len(),
            successful = results.successful.len(),
            failed = results.failed.len(),
            references = self.resolver.cached(),
            "Bulk import completed"
        );

        BulkImportResponse::from_results(results)
    }

    async fn store_one(&mut self, draft: &FlashlightDraft) -> Result<Flashlight, ImportError> {
        RecordWriter::new(self.pool)
            .with_manufacturers(self.options.manufacturers)
            .create(&mut self.resolver, self.user_id, draft)
            .await
    }

    /// Resolver state for this batch
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }
}
