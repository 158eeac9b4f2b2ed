//! Reference Resolver
//!
//! Maps a free-text label (manufacturer name, emitter-type name) onto the id
//! of its shared reference row, optionally creating the row.
//!
//! One resolver instance carries a label cache. The cache is scoped to one
//! bulk batch or one single-item request and dropped afterwards. Reference
//! rows are written on the pool, outside any record transaction. A
//! rolled-back record therefore never leaves a cached id behind that points
//! at a rolled-back row.

use std::collections::HashMap;
use std::fmt;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::ImportError;

/// Shared reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Manufacturer,
    EmitterType,
}

impl ReferenceKind {
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Manufacturer => "manufacturers",
            ReferenceKind::EmitterType => "emitter_types",
        }
    }

    /// Unique label column
    pub fn column(&self) -> &'static str {
        "name"
    }

    /// Description stored for rows created on demand
    fn description_for(&self, label: &str) -> Option<String> {
        match self {
            ReferenceKind::Manufacturer => None,
            ReferenceKind::EmitterType => Some(format!("{} LED emitter", label)),
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Manufacturer => f.write_str("manufacturer"),
            ReferenceKind::EmitterType => f.write_str("emitter type"),
        }
    }
}

/// What to do when a label has no reference row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReference {
    /// Insert a new row with the label as its name
    Create,
    /// Fail with `ImportError::UnknownReference`
    Reject,
}

/// Label → reference id resolution with a per-instance cache
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    cache: HashMap<(ReferenceKind, String), i64>,
    created: usize,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `label` to a reference id
    ///
    /// A blank label is "no reference" and yields `Ok(None)` without a lookup.
    /// Otherwise matching is case-sensitive and exact; surrounding whitespace
    /// is part of the label.
    pub async fn resolve(
        &mut self,
        pool: &SqlitePool,
        kind: ReferenceKind,
        label: &str,
        policy: MissingReference,
    ) -> Result<Option<i64>, ImportError> {
        if label.trim().is_empty() {
            return Ok(None);
        }

        let key = (kind, label.to_string());
        if let Some(id) = self.cache.get(&key) {
            return Ok(Some(*id));
        }

        let id = match find_reference(pool, kind, label).await? {
            Some(id) => id,
            None => match policy {
                MissingReference::Reject => {
                    return Err(ImportError::UnknownReference {
                        kind,
                        label: label.to_string(),
                    })
                }
                MissingReference::Create => {
                    let id = create_or_refetch(pool, kind, label).await?;
                    self.created += 1;
                    id
                }
            },
        };

        self.cache.insert(key, id);
        Ok(Some(id))
    }

    /// Number of distinct labels resolved so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Reference rows this resolver attempted to create (including lost races)
    pub fn created(&self) -> usize {
        self.created
    }
}

/// Select a reference id by exact name
async fn find_reference(
    pool: &SqlitePool,
    kind: ReferenceKind,
    label: &str,
) -> Result<Option<i64>, ImportError> {
    let sql = format!("SELECT id FROM {} WHERE {} = ?", kind.table(), kind.column());

    sqlx::query_scalar::<_, i64>(&sql)
        .bind(label)
        .fetch_optional(pool)
        .await
        .map_err(|e| ImportError::LookupFailed {
            kind,
            label: label.to_string(),
            reason: e.to_string(),
        })
}

/// Insert a reference row; on a uniqueness conflict re-fetch once
///
/// A concurrent creator winning the race is "already exists", not a failure.
pub(crate) async fn create_or_refetch(
    pool: &SqlitePool,
    kind: ReferenceKind,
    label: &str,
) -> Result<i64, ImportError> {
    let inserted = match kind.description_for(label) {
        Some(description) => {
            let sql = format!(
                "INSERT INTO {} ({}, description) VALUES (?, ?)",
                kind.table(),
                kind.column()
            );
            sqlx::query(&sql)
                .bind(label)
                .bind(description)
                .execute(pool)
                .await
        }
        None => {
            let sql = format!("INSERT INTO {} ({}) VALUES (?)", kind.table(), kind.column());
            sqlx::query(&sql).bind(label).execute(pool).await
        }
    };

    match inserted {
        Ok(done) => {
            info!(kind = %kind, label = %label, "Created reference row");
            Ok(done.last_insert_rowid())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            debug!(kind = %kind, label = %label, "Reference created concurrently, re-fetching");
            find_reference(pool, kind, label)
                .await?
                .ok_or_else(|| ImportError::CreateFailed {
                    kind,
                    label: label.to_string(),
                    reason: "row missing after uniqueness conflict".to_string(),
                })
        }
        Err(e) => Err(ImportError::CreateFailed {
            kind,
            label: label.to_string(),
            reason: e.to_string(),
        }),
    }
}
