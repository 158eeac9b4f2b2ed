//! Flashlight read-back
//!
//! Records are always read scoped to their owning user. Emitter type names
//! come from the reference row when linked, else from the stored label.

use std::collections::HashMap;
use std::str::FromStr;

use lumen_common::{EmitterColor, FlashlightStatus, ShippingStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Emitter, Flashlight};

const FLASHLIGHT_COLUMNS: &str = r#"
    f.guid, f.user_id, f.model, f.manufacturer_id, m.name AS manufacturer,
    f.finish, f.finish_group, f.battery_type, f.driver, f.ui, f.anduril,
    f.form_factors, f.ip_rating, f.special_features, f.notes, f.purchase_date,
    f.status, f.shipping_status, f.created_at, f.updated_at
"#;

const EMITTER_COLUMNS: &str = r#"
    e.guid, e.flashlight_id, e.emitter_type_id,
    COALESCE(t.name, e.type_label) AS type_name,
    e.cct, e.count, e.color, e.created_at
"#;

/// Load one flashlight owned by `user_id`
pub async fn load_flashlight(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Flashlight>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM flashlights f
        JOIN manufacturers m ON m.id = f.manufacturer_id
        WHERE f.guid = ? AND f.user_id = ?
        "#,
        FLASHLIGHT_COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut flashlight = flashlight_from_row(&row)?;

    let sql = format!(
        r#"
        SELECT {}
        FROM emitters e
        LEFT JOIN emitter_types t ON t.id = e.emitter_type_id
        WHERE e.flashlight_id = ?
        ORDER BY e.position
        "#,
        EMITTER_COLUMNS
    );

    let rows = sqlx::query(&sql).bind(id.to_string()).fetch_all(pool).await?;
    flashlight.emitters = rows.iter().map(emitter_from_row).collect::<Result<_, _>>()?;

    Ok(Some(flashlight))
}

/// All flashlights owned by `user_id`, newest first
pub async fn list_flashlights(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Flashlight>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM flashlights f
        JOIN manufacturers m ON m.id = f.manufacturer_id
        WHERE f.user_id = ?
        ORDER BY f.created_at DESC, f.rowid DESC
        "#,
        FLASHLIGHT_COLUMNS
    );

    let rows = sqlx::query(&sql).bind(user_id.to_string()).fetch_all(pool).await?;
    let mut flashlights = rows
        .iter()
        .map(flashlight_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    // One query for every child row, grouped by parent
    let sql = format!(
        r#"
        SELECT {}
        FROM emitters e
        JOIN flashlights f ON f.guid = e.flashlight_id
        LEFT JOIN emitter_types t ON t.id = e.emitter_type_id
        WHERE f.user_id = ?
        ORDER BY e.flashlight_id, e.position
        "#,
        EMITTER_COLUMNS
    );

    let rows = sqlx::query(&sql).bind(user_id.to_string()).fetch_all(pool).await?;
    let mut by_parent: HashMap<Uuid, Vec<Emitter>> = HashMap::new();
    for row in &rows {
        let emitter = emitter_from_row(row)?;
        by_parent.entry(emitter.flashlight_id).or_default().push(emitter);
    }

    for flashlight in &mut flashlights {
        flashlight.emitters = by_parent.remove(&flashlight.id).unwrap_or_default();
    }

    Ok(flashlights)
}

fn flashlight_from_row(row: &SqliteRow) -> Result<Flashlight, sqlx::Error> {
    let shipping_status: Option<String> = row.try_get("shipping_status")?;

    Ok(Flashlight {
        id: uuid_column(row, "guid")?,
        user_id: uuid_column(row, "user_id")?,
        model: row.try_get("model")?,
        manufacturer_id: row.try_get("manufacturer_id")?,
        manufacturer: row.try_get("manufacturer")?,
        finish: row.try_get("finish")?,
        finish_group: row.try_get("finish_group")?,
        battery_type: row.try_get("battery_type")?,
        driver: row.try_get("driver")?,
        ui: row.try_get("ui")?,
        anduril: row.try_get("anduril")?,
        form_factors: json_list_column(row, "form_factors")?,
        ip_rating: row.try_get("ip_rating")?,
        special_features: json_list_column(row, "special_features")?,
        notes: row.try_get("notes")?,
        purchase_date: row.try_get("purchase_date")?,
        status: parse_column::<FlashlightStatus>(&row.try_get::<String, _>("status")?)?,
        shipping_status: shipping_status
            .as_deref()
            .map(parse_column::<ShippingStatus>)
            .transpose()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        emitters: Vec::new(),
    })
}

fn emitter_from_row(row: &SqliteRow) -> Result<Emitter, sqlx::Error> {
    Ok(Emitter {
        id: uuid_column(row, "guid")?,
        flashlight_id: uuid_column(row, "flashlight_id")?,
        emitter_type_id: row.try_get("emitter_type_id")?,
        emitter_type: row.try_get("type_name")?,
        cct: row.try_get("cct")?,
        count: row.try_get("count")?,
        color: parse_column::<EmitterColor>(&row.try_get::<String, _>("color")?)?,
        created_at: row.try_get("created_at")?,
    })
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn json_list_column(row: &SqliteRow, column: &str) -> Result<Vec<String>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn parse_column<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = lumen_common::Error>,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
