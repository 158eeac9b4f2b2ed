//! lumen-migrate - Legacy collection migration
//!
//! Reads a JSON array of legacy flashlight records, normalizes them and
//! submits them to a running lumen-api in chunks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_common::api::{BulkImportRequest, FlashlightInput};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumen_migrate::{transform, LegacyFlashlight, MigrationClient, MigrationTotals};

/// Command-line arguments for lumen-migrate
#[derive(Parser, Debug)]
#[command(name = "lumen-migrate")]
#[command(about = "Import a legacy flashlight list into lumen-api")]
#[command(version)]
struct Args {
    /// JSON file holding an array of legacy records
    #[arg(short, long)]
    input: PathBuf,

    /// Base URL of the lumen-api service
    #[arg(long, default_value = "http://127.0.0.1:5740", env = "LUMEN_API_URL")]
    api_url: String,

    /// Bearer token (see `lumen-api issue-token`)
    #[arg(long, env = "LUMEN_AUTH_TOKEN", required_unless_present = "dry_run")]
    token: Option<String>,

    /// Items per bulk request
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    batch_size: u16,

    /// Print the transformed payload instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen_migrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let lights: Vec<LegacyFlashlight> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    info!("Found {} flashlights to migrate", lights.len());

    let mut totals = MigrationTotals::default();
    let mut items: Vec<FlashlightInput> = Vec::with_capacity(lights.len());
    for light in &lights {
        match transform(light) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping {} {}: {}", light.manufacturer, light.model, e);
                totals.record_batch_failure(1);
            }
        }
    }

    if args.dry_run {
        let payload = BulkImportRequest { flashlights: items };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let token = args.token.context("--token or LUMEN_AUTH_TOKEN is required")?;
    let client = MigrationClient::new(&args.api_url, &token)?;

    let batch_size = usize::from(args.batch_size);
    let batches = items.len().div_ceil(batch_size);
    for (index, batch) in items.chunks(batch_size).enumerate() {
        info!("Processing batch {} of {}", index + 1, batches);

        match client.post_batch(batch).await {
            Ok(response) => totals.record_response(&response),
            Err(e) => {
                error!("Batch failed: {}", e);
                totals.record_batch_failure(batch.len());
            }
        }
    }

    println!("=== Migration Summary ===");
    println!("Successfully migrated: {} flashlights", totals.successful);
    println!("Failed: {} flashlights", totals.failed);

    Ok(())
}
