//! Bulk import client
//!
//! Posts chunks to `POST /api/flashlights/bulk` with a bearer token and
//! accumulates the per-chunk summaries.

use std::time::Duration;

use lumen_common::api::{BulkImportRequest, BulkImportResponse, FlashlightInput};
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("lumen-migrate/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Migration client errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Service returned an error response
    #[error("API error: {0} - {1}")]
    Api(u16, String),

    /// Failed to parse the response body
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for one lumen-api instance
pub struct MigrationClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl MigrationClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, MigrationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Submit one chunk to the bulk endpoint
    pub async fn post_batch(&self, items: &[FlashlightInput]) -> Result<BulkImportResponse, MigrationError> {
        let url = format!("{}/api/flashlights/bulk", self.base_url);
        let body = BulkImportRequest {
            flashlights: items.to_vec(),
        };

        debug!(url = %url, items = items.len(), "Posting bulk chunk");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MigrationError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| MigrationError::Parse(e.to_string()))
    }
}

/// Running totals across chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationTotals {
    pub successful: usize,
    pub failed: usize,
}

impl MigrationTotals {
    /// Fold in a chunk the service processed, logging its failed items
    pub fn record_response(&mut self, response: &BulkImportResponse) {
        self.successful += response.summary.successful;
        self.failed += response.summary.failed;

        for failure in &response.results.failed {
            warn!("- {} {}: {}", failure.manufacturer, failure.model, failure.error);
        }
    }

    /// Count a chunk the service never processed as entirely failed
    pub fn record_batch_failure(&mut self, items: usize) {
        self.failed += items;
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}
