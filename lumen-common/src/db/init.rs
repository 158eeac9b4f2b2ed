//! Database initialization
//!
//! Opens (creating if needed) the SQLite database, applies connection
//! pragmas, creates the schema idempotently and seeds reference rows.

use crate::catalog::{EmitterColor, FlashlightStatus, ShippingStatus, KNOWN_MANUFACTURERS};
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas set on the options apply to every pooled connection,
    // foreign_keys included (ON DELETE CASCADE depends on it)
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    seed_manufacturers(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_api_tokens_table(pool).await?;
    create_sessions_table(pool).await?;

    // Shared reference tables
    create_manufacturers_table(pool).await?;
    create_emitter_types_table(pool).await?;

    // Owned records
    create_flashlights_table(pool).await?;
    create_emitters_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Long-lived bearer credentials; only the SHA-256 of each token is stored
async fn create_api_tokens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_tokens (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            label TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_used_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Browser sessions carried in a cookie
async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            expires_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_manufacturers_table(pool: &SqlitePool) -> Result<()> {
    // UNIQUE(name) arbitrates concurrent creation of the same label
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manufacturers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_emitter_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emitter_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_flashlights_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS flashlights (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            model TEXT NOT NULL,
            manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id),
            finish TEXT NOT NULL DEFAULT '',
            finish_group TEXT NOT NULL DEFAULT '',
            battery_type TEXT NOT NULL,
            driver TEXT NOT NULL DEFAULT '',
            ui TEXT NOT NULL DEFAULT '',
            anduril INTEGER NOT NULL DEFAULT 0,
            form_factors TEXT NOT NULL DEFAULT '[]',
            ip_rating TEXT,
            special_features TEXT NOT NULL DEFAULT '[]',
            notes TEXT,
            purchase_date TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL CHECK (status IN ({})),
            shipping_status TEXT CHECK (shipping_status IS NULL OR shipping_status IN ({})),
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
        sql_in_list(FlashlightStatus::ALL.iter().map(|s| s.as_str())),
        sql_in_list(ShippingStatus::ALL.iter().map(|s| s.as_str())),
    );
    sqlx::query(&sql).execute(pool).await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_flashlights_user ON flashlights(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_emitters_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS emitters (
            guid TEXT PRIMARY KEY,
            flashlight_id TEXT NOT NULL REFERENCES flashlights(guid) ON DELETE CASCADE,
            emitter_type_id INTEGER REFERENCES emitter_types(id),
            type_label TEXT,
            cct TEXT,
            count INTEGER NOT NULL CHECK (count >= 1),
            color TEXT NOT NULL DEFAULT 'White' CHECK (color IN ({})),
            position INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL
        )
        "#,
        sql_in_list(EmitterColor::ALL.iter().map(|c| c.as_str())),
    );
    sqlx::query(&sql).execute(pool).await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_emitters_flashlight ON emitters(flashlight_id, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed canonical manufacturers (existing rows are left alone)
async fn seed_manufacturers(pool: &SqlitePool) -> Result<()> {
    for name in KNOWN_MANUFACTURERS {
        sqlx::query("INSERT OR IGNORE INTO manufacturers (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Quote catalog values for a CHECK (... IN (...)) clause
fn sql_in_list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}
