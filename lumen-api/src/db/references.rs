//! Reference table listings

use sqlx::{Row, SqlitePool};

use crate::models::ReferenceRow;
use crate::services::ReferenceKind;

/// Every row of a reference table, ordered by name
pub async fn list_references(pool: &SqlitePool, kind: ReferenceKind) -> Result<Vec<ReferenceRow>, sqlx::Error> {
    let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());

    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| ReferenceRow {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}
