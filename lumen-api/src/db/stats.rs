//! Collection statistics

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lumen_common::FlashlightStatus;

/// Summary of one user's collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    pub total: i64,
    /// Every status is present, zero when unused
    pub by_status: BTreeMap<String, i64>,
    pub by_manufacturer: BTreeMap<String, i64>,
    /// Sum of emitter counts across all flashlights
    pub emitters: i64,
    /// Flashlights running Anduril firmware
    pub anduril: i64,
}

/// Compute statistics for `user_id`'s flashlights
pub async fn collection_stats(pool: &SqlitePool, user_id: Uuid) -> Result<CollectionStats, sqlx::Error> {
    let user = user_id.to_string();
    let mut stats = CollectionStats::default();

    for status in FlashlightStatus::ALL {
        stats.by_status.insert(status.as_str().to_string(), 0);
    }

    let rows = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM flashlights WHERE user_id = ? GROUP BY status",
    )
    .bind(&user)
    .fetch_all(pool)
    .await?;

    for row in &rows {
        let n: i64 = row.get("n");
        stats.total += n;
        stats.by_status.insert(row.get("status"), n);
    }

    let rows = sqlx::query(
        r#"
        SELECT m.name AS name, COUNT(*) AS n
        FROM flashlights f
        JOIN manufacturers m ON m.id = f.manufacturer_id
        WHERE f.user_id = ?
        GROUP BY m.name
        "#,
    )
    .bind(&user)
    .fetch_all(pool)
    .await?;

    for row in &rows {
        stats.by_manufacturer.insert(row.get("name"), row.get("n"));
    }

    stats.emitters = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(e.count), 0)
        FROM emitters e
        JOIN flashlights f ON f.guid = e.flashlight_id
        WHERE f.user_id = ?
        "#,
    )
    .bind(&user)
    .fetch_one(pool)
    .await?;

    stats.anduril = sqlx::query_scalar("SELECT COUNT(*) FROM flashlights WHERE user_id = ? AND anduril = 1")
        .bind(&user)
        .fetch_one(pool)
        .await?;

    Ok(stats)
}
