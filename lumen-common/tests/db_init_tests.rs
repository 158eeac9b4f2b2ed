//! Unit tests for database initialization
//!
//! Tests cover:
//! - Automatic database creation (including missing parent directories)
//! - Idempotent re-initialization
//! - Manufacturer seeding
//! - Constraints the service relies on (unique names, cascade, count >= 1)

use lumen_common::catalog::KNOWN_MANUFACTURERS;
use lumen_common::db::{create_user, init_database};
use chrono::Utc;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("lumen.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lumen.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_manufacturers_seeded_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lumen.db");

    drop(init_database(&db_path).await.unwrap());
    let pool = init_database(&db_path).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM manufacturers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count as usize, KNOWN_MANUFACTURERS.len());

    let acebeam: Option<i64> = sqlx::query_scalar("SELECT id FROM manufacturers WHERE name = 'Acebeam'")
        .fetch_optional(&pool)
        .await
        .unwrap();
    assert!(acebeam.is_some());
}

#[tokio::test]
async fn test_reference_names_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("lumen.db")).await.unwrap();

    sqlx::query("INSERT INTO emitter_types (name) VALUES ('519A')")
        .execute(&pool)
        .await
        .unwrap();
    let duplicate = sqlx::query("INSERT INTO emitter_types (name) VALUES ('519A')")
        .execute(&pool)
        .await;

    let err = duplicate.expect_err("duplicate name should violate UNIQUE");
    let is_unique = err
        .as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false);
    assert!(is_unique, "expected unique violation, got {:?}", err);
}

#[tokio::test]
async fn test_emitters_cascade_and_count_check() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("lumen.db")).await.unwrap();
    let user = create_user(&pool, "schema@example.com").await.unwrap();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO flashlights (guid, user_id, model, manufacturer_id, battery_type, status, created_at, updated_at)
         VALUES ('f1', ?, 'D4V2', 1, '18650', 'Owned', ?, ?)",
    )
    .bind(user.guid.to_string())
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    let zero_count = sqlx::query(
        "INSERT INTO emitters (guid, flashlight_id, count, color, position, created_at)
         VALUES ('e0', 'f1', 0, 'White', 0, ?)",
    )
    .bind(now)
    .execute(&pool)
    .await;
    assert!(zero_count.is_err(), "count = 0 must violate CHECK");

    sqlx::query(
        "INSERT INTO emitters (guid, flashlight_id, count, color, position, created_at)
         VALUES ('e1', 'f1', 4, 'White', 0, ?)",
    )
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("DELETE FROM flashlights WHERE guid = 'f1'")
        .execute(&pool)
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emitters")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0, "emitters must be deleted with their flashlight");
}

#[tokio::test]
async fn test_unknown_status_rejected_by_schema() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("lumen.db")).await.unwrap();
    let user = create_user(&pool, "status@example.com").await.unwrap();
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO flashlights (guid, user_id, model, manufacturer_id, battery_type, status, created_at, updated_at)
         VALUES ('f2', ?, 'TS10', 1, '14500', 'Gifted', ?, ?)",
    )
    .bind(user.guid.to_string())
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await;

    assert!(result.is_err());
}
