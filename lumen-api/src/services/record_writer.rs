//! Transactional Writer
//!
//! Persists a flashlight and its emitters as one unit. References are
//! resolved first, on the pool; the parent row and every child row are then
//! written in a single transaction. Any failure drops the transaction, so a
//! flashlight is never left without the emitters it was submitted with.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::load_flashlight;
use crate::error::{ImportError, ValidationError};
use crate::models::{EmitterDraft, EmitterPatch, Flashlight, FlashlightDraft};
use crate::services::reference_resolver::{MissingReference, ReferenceKind, ReferenceResolver};

/// Emitter draft with its type reference resolved
struct ResolvedEmitter<'a> {
    draft: &'a EmitterDraft,
    emitter_type_id: Option<i64>,
}

/// Writes flashlight records owned by one user
pub struct RecordWriter<'a> {
    pool: &'a SqlitePool,
    manufacturers: MissingReference,
}

impl<'a> RecordWriter<'a> {
    /// Writer that creates unknown manufacturers on demand
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            manufacturers: MissingReference::Create,
        }
    }

    /// Override the policy for unknown manufacturer labels
    pub fn with_manufacturers(mut self, policy: MissingReference) -> Self {
        self.manufacturers = policy;
        self
    }

    /// Store a new flashlight and return it as stored
    pub async fn create(
        &self,
        resolver: &mut ReferenceResolver,
        user_id: Uuid,
        draft: &FlashlightDraft,
    ) -> Result<Flashlight, ImportError> {
        let manufacturer_id = self.resolve_manufacturer(resolver, draft).await?;
        let emitters = self.resolve_emitters(resolver, &draft.emitters).await?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO flashlights (
                guid, user_id, model, manufacturer_id, finish, finish_group,
                battery_type, driver, ui, anduril, form_factors, ip_rating,
                special_features, notes, purchase_date, status, shipping_status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(&draft.model)
        .bind(manufacturer_id)
        .bind(&draft.finish)
        .bind(&draft.finish_group)
        .bind(&draft.battery_type)
        .bind(&draft.driver)
        .bind(&draft.ui)
        .bind(draft.anduril)
        .bind(json_list(&draft.form_factors)?)
        .bind(&draft.ip_rating)
        .bind(json_list(&draft.special_features)?)
        .bind(&draft.notes)
        .bind(&draft.purchase_date)
        .bind(draft.status.as_str())
        .bind(draft.shipping_status.map(|s| s.as_str()))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_failed)?;

        insert_emitters(&mut tx, id, &emitters).await?;

        tx.commit().await.map_err(write_failed)?;
        debug!(flashlight = %id, emitters = emitters.len(), "Stored flashlight");

        self.read_back(user_id, id).await
    }

    /// Replace the fields of an existing flashlight
    ///
    /// Emitters are replaced only when `replace_emitters` is set; an empty
    /// draft list then leaves the flashlight with no emitters.
    pub async fn update(
        &self,
        resolver: &mut ReferenceResolver,
        user_id: Uuid,
        id: Uuid,
        draft: &FlashlightDraft,
        replace_emitters: bool,
    ) -> Result<Flashlight, ImportError> {
        let manufacturer_id = self.resolve_manufacturer(resolver, draft).await?;
        let emitters = if replace_emitters {
            self.resolve_emitters(resolver, &draft.emitters).await?
        } else {
            Vec::new()
        };

        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE flashlights SET
                model = ?, manufacturer_id = ?, finish = ?, finish_group = ?,
                battery_type = ?, driver = ?, ui = ?, anduril = ?, form_factors = ?,
                ip_rating = ?, special_features = ?, notes = ?, purchase_date = ?,
                status = ?, shipping_status = ?, updated_at = ?
            WHERE guid = ? AND user_id = ?
            "#,
        )
        .bind(&draft.model)
        .bind(manufacturer_id)
        .bind(&draft.finish)
        .bind(&draft.finish_group)
        .bind(&draft.battery_type)
        .bind(&draft.driver)
        .bind(&draft.ui)
        .bind(draft.anduril)
        .bind(json_list(&draft.form_factors)?)
        .bind(&draft.ip_rating)
        .bind(json_list(&draft.special_features)?)
        .bind(&draft.notes)
        .bind(&draft.purchase_date)
        .bind(draft.status.as_str())
        .bind(draft.shipping_status.map(|s| s.as_str()))
        .bind(Utc::now())
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_failed)?;

        if updated.rows_affected() == 0 {
            return Err(ImportError::NotFound("Flashlight not found".to_string()));
        }

        if replace_emitters {
            sqlx::query("DELETE FROM emitters WHERE flashlight_id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(write_failed)?;

            insert_emitters(&mut tx, id, &emitters).await?;
        }

        tx.commit().await.map_err(write_failed)?;
        debug!(flashlight = %id, replace_emitters, "Updated flashlight");

        self.read_back(user_id, id).await
    }

    /// Edit one emitter of a flashlight owned by `user_id`
    pub async fn patch_emitter(
        &self,
        resolver: &mut ReferenceResolver,
        user_id: Uuid,
        flashlight_id: Uuid,
        emitter_id: Uuid,
        patch: &EmitterPatch,
    ) -> Result<Flashlight, ImportError> {
        let current = sqlx::query_as::<_, (Option<i64>, Option<String>, Option<String>, i64, String)>(
            r#"
            SELECT e.emitter_type_id, e.type_label, e.cct, e.count, e.color
            FROM emitters e
            JOIN flashlights f ON f.guid = e.flashlight_id
            WHERE e.guid = ? AND f.guid = ? AND f.user_id = ?
            "#,
        )
        .bind(emitter_id.to_string())
        .bind(flashlight_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(self.pool)
        .await?;

        let Some((mut type_id, mut type_label, mut cct, mut count, mut color)) = current else {
            return Err(ImportError::NotFound("Emitter not found".to_string()));
        };

        if let Some(label) = &patch.type_label {
            type_id = match label {
                Some(label) => {
                    resolver
                        .resolve(self.pool, ReferenceKind::EmitterType, label, MissingReference::Create)
                        .await?
                }
                None => None,
            };
            type_label = label.clone();
        }
        if let Some(value) = &patch.cct {
            cct = value.clone();
        }
        if let Some(value) = patch.count {
            count = value;
        }
        if let Some(value) = patch.color {
            color = value.as_str().to_string();
        }

        let mut tx = self.begin().await?;

        sqlx::query(
            "UPDATE emitters SET emitter_type_id = ?, type_label = ?, cct = ?, count = ?, color = ? WHERE guid = ?",
        )
        .bind(type_id)
        .bind(type_label)
        .bind(cct)
        .bind(count)
        .bind(color)
        .bind(emitter_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_failed)?;

        sqlx::query("UPDATE flashlights SET updated_at = ? WHERE guid = ?")
            .bind(Utc::now())
            .bind(flashlight_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(write_failed)?;

        tx.commit().await.map_err(write_failed)?;

        self.read_back(user_id, flashlight_id).await
    }

    /// Delete a flashlight owned by `user_id` (emitters cascade)
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ImportError> {
        let result = sqlx::query("DELETE FROM flashlights WHERE guid = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ImportError::NotFound("Flashlight not found".to_string()));
        }

        debug!(flashlight = %id, "Deleted flashlight");
        Ok(())
    }

    async fn resolve_manufacturer(
        &self,
        resolver: &mut ReferenceResolver,
        draft: &FlashlightDraft,
    ) -> Result<i64, ImportError> {
        resolver
            .resolve(self.pool, ReferenceKind::Manufacturer, &draft.manufacturer, self.manufacturers)
            .await?
            .ok_or_else(|| ValidationError::new("manufacturer_name", "is required").into())
    }

    async fn resolve_emitters<'d>(
        &self,
        resolver: &mut ReferenceResolver,
        drafts: &'d [EmitterDraft],
    ) -> Result<Vec<ResolvedEmitter<'d>>, ImportError> {
        let mut resolved = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let emitter_type_id = match &draft.type_label {
                Some(label) => {
                    resolver
                        .resolve(self.pool, ReferenceKind::EmitterType, label, MissingReference::Create)
                        .await?
                }
                None => None,
            };
            resolved.push(ResolvedEmitter { draft, emitter_type_id });
        }

        Ok(resolved)
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, ImportError> {
        self.pool.begin().await.map_err(write_failed)
    }

    async fn read_back(&self, user_id: Uuid, id: Uuid) -> Result<Flashlight, ImportError> {
        load_flashlight(self.pool, user_id, id)
            .await?
            .ok_or_else(|| ImportError::NotFound("Flashlight not found".to_string()))
    }
}

async fn insert_emitters(
    tx: &mut Transaction<'static, Sqlite>,
    flashlight_id: Uuid,
    emitters: &[ResolvedEmitter<'_>],
) -> Result<(), ImportError> {
    let now = Utc::now();

    for (position, emitter) in emitters.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO emitters (
                guid, flashlight_id, emitter_type_id, type_label, cct, count, color,
                position, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(flashlight_id.to_string())
        .bind(emitter.emitter_type_id)
        .bind(&emitter.draft.type_label)
        .bind(&emitter.draft.cct)
        .bind(emitter.draft.count)
        .bind(emitter.draft.color.as_str())
        .bind(position as i64)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            warn!(flashlight = %flashlight_id, position, "Emitter insert failed, rolling back: {}", e);
            write_failed(e)
        })?;
    }

    Ok(())
}

fn json_list(values: &[String]) -> Result<String, ImportError> {
    serde_json::to_string(values).map_err(|e| ImportError::WriteFailed(e.to_string()))
}

fn write_failed(err: sqlx::Error) -> ImportError {
    ImportError::WriteFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compose_flashlight;
    use crate::test_support::TestDb;
    use lumen_common::{EmitterColor, FlashlightStatus, ShippingStatus};
    use serde_json::json;

    fn draft(model: &str, emitters: Vec<EmitterDraft>) -> FlashlightDraft {
        let mut draft = compose_flashlight(&json!({
            "model": model,
            "manufacturer_name": "Wurkkos",
            "battery_type": "18650",
            "status": "Owned",
        }))
        .unwrap();
        draft.emitters = emitters;
        draft
    }

    fn emitter(label: &str, count: i64) -> EmitterDraft {
        EmitterDraft {
            type_label: Some(label.to_string()),
            cct: Some("5000K".to_string()),
            count,
            color: EmitterColor::White,
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_stored_record_in_order() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(
                &mut resolver,
                db.user_id,
                &draft("TS10", vec![emitter("519A", 1), emitter("SST20", 2), emitter("519A", 3)]),
            )
            .await
            .unwrap();

        assert_eq!(stored.model, "TS10");
        assert_eq!(stored.manufacturer, "Wurkkos");
        let labels: Vec<_> = stored.emitters.iter().map(|e| e.emitter_type.clone().unwrap()).collect();
        assert_eq!(labels, vec!["519A", "SST20", "519A"]);
        let counts: Vec<_> = stored.emitters.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(stored.emitters[0].emitter_type_id, stored.emitters[2].emitter_type_id);
    }

    #[tokio::test]
    async fn test_child_failure_rolls_back_parent() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        // count 0 violates the emitters CHECK constraint on the second child
        let result = writer
            .create(&mut resolver, db.user_id, &draft("FC11", vec![emitter("519A", 1), emitter("519A", 0)]))
            .await;

        assert!(matches!(result, Err(ImportError::WriteFailed(_))));
        assert_eq!(count(&db.pool, "flashlights").await, 0);
        assert_eq!(count(&db.pool, "emitters").await, 0);
    }

    #[tokio::test]
    async fn test_update_with_empty_emitters_clears_children() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(&mut resolver, db.user_id, &draft("D4V2", vec![emitter("SST20", 4)]))
            .await
            .unwrap();

        let updated = writer
            .update(&mut resolver, db.user_id, stored.id, &draft("D4V2", Vec::new()), true)
            .await
            .unwrap();

        assert!(updated.emitters.is_empty());
        assert_eq!(count(&db.pool, "emitters").await, 0);
    }

    #[tokio::test]
    async fn test_update_without_emitters_keeps_children() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(&mut resolver, db.user_id, &draft("D4V2", vec![emitter("SST20", 4)]))
            .await
            .unwrap();

        let updated = writer
            .update(&mut resolver, db.user_id, stored.id, &draft("D4V2 Ti", Vec::new()), false)
            .await
            .unwrap();

        assert_eq!(updated.model, "D4V2 Ti");
        assert_eq!(updated.emitters.len(), 1);
        assert_eq!(updated.emitters[0].id, stored.emitters[0].id);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_old_children() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(&mut resolver, db.user_id, &draft("SC31", vec![emitter("SST40", 1)]))
            .await
            .unwrap();

        let result = writer
            .update(&mut resolver, db.user_id, stored.id, &draft("SC31 Pro", vec![emitter("SST40", 0)]), true)
            .await;
        assert!(matches!(result, Err(ImportError::WriteFailed(_))));

        let reloaded = load_flashlight(&db.pool, db.user_id, stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.model, "SC31");
        assert_eq!(reloaded.emitters.len(), 1);
    }

    #[tokio::test]
    async fn test_sold_with_shipping_status_persists() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let mut sold = draft("H03", Vec::new());
        sold.status = FlashlightStatus::Sold;
        sold.shipping_status = Some(ShippingStatus::Shipped);

        let stored = writer.create(&mut resolver, db.user_id, &sold).await.unwrap();

        assert_eq!(stored.status, FlashlightStatus::Sold);
        assert_eq!(stored.shipping_status, Some(ShippingStatus::Shipped));
    }

    #[tokio::test]
    async fn test_other_users_records_are_not_found() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(&mut resolver, db.user_id, &draft("M21A", Vec::new()))
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let result = writer.update(&mut resolver, stranger, stored.id, &draft("x", Vec::new()), false).await;
        assert!(matches!(result, Err(ImportError::NotFound(_))));
        assert!(matches!(writer.delete(stranger, stored.id).await, Err(ImportError::NotFound(_))));

        writer.delete(db.user_id, stored.id).await.unwrap();
        assert_eq!(count(&db.pool, "flashlights").await, 0);
    }

    #[tokio::test]
    async fn test_patch_emitter_changes_only_supplied_fields() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool);

        let stored = writer
            .create(&mut resolver, db.user_id, &draft("E75", vec![emitter("XHP70.3 HI", 1)]))
            .await
            .unwrap();
        let target = &stored.emitters[0];

        let patch = EmitterPatch {
            count: Some(2),
            color: Some(EmitterColor::Red),
            ..Default::default()
        };

        let patched = writer
            .patch_emitter(&mut resolver, db.user_id, stored.id, target.id, &patch)
            .await
            .unwrap();

        let emitter = &patched.emitters[0];
        assert_eq!(emitter.count, 2);
        assert_eq!(emitter.color, EmitterColor::Red);
        assert_eq!(emitter.cct.as_deref(), Some("5000K"));
        assert_eq!(emitter.emitter_type.as_deref(), Some("XHP70.3 HI"));

        let missing = writer
            .patch_emitter(&mut resolver, db.user_id, stored.id, Uuid::new_v4(), &patch)
            .await;
        assert!(matches!(missing, Err(ImportError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reject_policy_stores_nothing() {
        let db = TestDb::new().await;
        let mut resolver = ReferenceResolver::new();
        let writer = RecordWriter::new(&db.pool).with_manufacturers(MissingReference::Reject);

        let mut unknown = draft("M44", vec![emitter("SFT40", 1)]);
        unknown.manufacturer = "Zyntrex".to_string();

        let err = writer.create(&mut resolver, db.user_id, &unknown).await.unwrap_err();

        assert_eq!(err.to_string(), "Unknown manufacturer: Zyntrex");
        assert_eq!(count(&db.pool, "flashlights").await, 0);
    }
}
