//! Record pipeline properties, exercised through the library API
//!
//! Tests cover:
//! - Batch accounting (successful + failed == total == items)
//! - Whole-batch rejection of malformed input
//! - Emitter defaults (color White, absent cct stays null)
//! - Reference idempotence within a batch
//! - Round-trip of emitters in submitted order
//! - Rollback of the parent when a child insert fails

use lumen_api::db::load_flashlight;
use lumen_api::error::ImportError;
use lumen_api::models::EmitterDraft;
use lumen_api::services::{
    compose_flashlight, BulkImporter, BulkOptions, RecordWriter, ReferenceResolver,
};
use lumen_common::db::{create_user, init_database};
use lumen_common::EmitterColor;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

async fn setup() -> (TempDir, SqlitePool, Uuid) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("import.db")).await.unwrap();
    let user = create_user(&pool, "importer@example.com").await.unwrap();
    (dir, pool, user.guid)
}

fn item(model: &str, manufacturer: &str, emitters: Value) -> Value {
    json!({
        "model": model,
        "manufacturer_name": manufacturer,
        "finish": "",
        "battery_type": "18650",
        "emitters": emitters,
        "driver": "",
        "ui": "",
        "anduril": false,
        "form_factors": [],
        "ip_rating": null,
        "special_features": [],
        "notes": null,
        "purchase_date": "",
        "status": "Owned",
        "shipping_status": null,
    })
}

#[tokio::test]
async fn test_summary_accounts_for_every_item() {
    let (_dir, pool, user_id) = setup().await;

    let items = vec![
        item("S2+", "Convoy", json!([{"type": "519A", "cct": "4500K", "count": 1, "color": "White"}])),
        item("Z1", "Zyntrex", json!([])),
        item("M21B", "Convoy", json!([{"type": "SST40", "cct": null, "count": 1, "color": "Red"}])),
        item("BLF Q8", "Sofirn ", json!([{"type": "XPL HI", "cct": "5000K", "count": 4, "color": "White"}])),
    ];

    let mut importer = BulkImporter::new(&pool, user_id, BulkOptions::default());
    let response = importer.import(&items).await.unwrap();

    assert_eq!(response.summary.total, items.len());
    assert_eq!(
        response.summary.successful + response.summary.failed,
        response.summary.total
    );
    assert_eq!(response.results.successful.len(), response.summary.successful);
    assert_eq!(response.results.failed.len(), response.summary.failed);
    assert_eq!(response.summary.successful, 2);
}

#[tokio::test]
async fn test_invalid_batch_writes_nothing() {
    let (_dir, pool, user_id) = setup().await;

    let items = vec![
        item("S2+", "Convoy", json!([{"type": "519A", "count": 1}])),
        item("", "Convoy", json!([])),
        item("M21B", "Convoy", json!([{"type": "SST40", "count": 1, "color": "Teal"}])),
        json!(null),
    ];

    let mut importer = BulkImporter::new(&pool, user_id, BulkOptions::default());
    let invalid = importer.import(&items).await.unwrap_err();

    let indexes: Vec<usize> = invalid.iter().map(|i| i.index).collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    assert_eq!(invalid[0].field, "model");
    assert_eq!(invalid[1].field, "emitters[0].color");

    for table in ["flashlights", "emitters"] {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0, "{}", table);
    }
    let created_types: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emitter_types")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(created_types, 0);
}

#[tokio::test]
async fn test_emitter_defaults_are_stored() {
    let (_dir, pool, user_id) = setup().await;

    let draft = compose_flashlight(&item(
        "SC18",
        "Skilhunt",
        json!([{"type": "SST40", "count": 1}]),
    ))
    .unwrap();

    let mut resolver = ReferenceResolver::new();
    let stored = RecordWriter::new(&pool)
        .create(&mut resolver, user_id, &draft)
        .await
        .unwrap();

    assert_eq!(stored.emitters[0].color, EmitterColor::White);
    assert_eq!(stored.emitters[0].cct, None);

    let raw: (Option<String>, String) =
        sqlx::query_as("SELECT cct, color FROM emitters WHERE flashlight_id = ?")
            .bind(stored.id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(raw, (None, "White".to_string()));
}

#[tokio::test]
async fn test_reference_labels_resolve_to_one_row_per_batch() {
    let (_dir, pool, user_id) = setup().await;

    let items: Vec<Value> = ["One", "Two", "Three"]
        .iter()
        .map(|model| {
            item(
                model,
                "Nitecore",
                json!([
                    {"type": "UHi 40", "cct": "6500K", "count": 1},
                    {"type": "UHi 40", "cct": "6500K", "count": 1},
                ]),
            )
        })
        .collect();

    let mut importer = BulkImporter::new(&pool, user_id, BulkOptions::default());
    let response = importer.import(&items).await.unwrap();
    assert_eq!(response.summary.successful, 3);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emitter_types WHERE name = 'UHi 40'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let distinct_ids: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT emitter_type_id) FROM emitters")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(distinct_ids, 1);
}

#[tokio::test]
async fn test_round_trip_preserves_emitters_in_order() {
    let (_dir, pool, user_id) = setup().await;

    let emitters = json!([
        {"type": "SFT40", "cct": "6000K", "count": 1, "color": "White"},
        {"type": "Red 5mm", "cct": null, "count": 2, "color": "Red"},
        {"type": "365nm", "count": 1, "color": "UV"},
        {"type": "Green Laser Diode", "count": 1, "color": "Green Laser"},
    ]);

    let draft = compose_flashlight(&item("Multi", "Olight", emitters.clone())).unwrap();
    let mut resolver = ReferenceResolver::new();
    let stored = RecordWriter::new(&pool)
        .create(&mut resolver, user_id, &draft)
        .await
        .unwrap();

    let reloaded = load_flashlight(&pool, user_id, stored.id).await.unwrap().unwrap();
    assert_eq!(reloaded.emitters.len(), 4);

    for (emitter, expected) in reloaded.emitters.iter().zip(emitters.as_array().unwrap()) {
        assert_eq!(emitter.emitter_type.as_deref(), expected["type"].as_str());
        assert_eq!(emitter.count, expected["count"].as_i64().unwrap());
        assert_eq!(emitter.cct.as_deref(), expected["cct"].as_str());
        assert_eq!(
            emitter.color.as_str(),
            expected["color"].as_str().unwrap_or("White")
        );
    }
}

#[tokio::test]
async fn test_failed_child_leaves_no_parent() {
    let (_dir, pool, user_id) = setup().await;

    let mut draft = compose_flashlight(&item("Broken", "Acebeam", json!([]))).unwrap();
    draft.emitters = vec![
        EmitterDraft {
            type_label: Some("XHP50.3 HI".to_string()),
            cct: None,
            count: 1,
            color: EmitterColor::White,
        },
        EmitterDraft {
            type_label: None,
            cct: None,
            count: 0,
            color: EmitterColor::White,
        },
    ];

    let mut resolver = ReferenceResolver::new();
    let result = RecordWriter::new(&pool).create(&mut resolver, user_id, &draft).await;
    assert!(matches!(result, Err(ImportError::WriteFailed(_))));

    let parents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flashlights WHERE model = 'Broken'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(parents, 0);

    let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emitters")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(children, 0);
}
