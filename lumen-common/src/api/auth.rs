//! Credential hashing, issuance and lookup
//!
//! Bearer tokens and session tokens are 32 random bytes rendered as 64 hex
//! characters. Only the SHA-256 of a token is persisted, so a leaked
//! database cannot be replayed as credentials.
//!
//! This module contains pure functions and database operations only; the
//! HTTP gate that consumes them lives in `lumen-api`.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{Error, Result};

/// Length in bytes of a freshly generated token
pub const TOKEN_BYTES: usize = 32;

// ========================================
// Token primitives
// ========================================

/// Generate a new random token (64 hex chars)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// SHA-256 of a token as 64 hex characters
///
/// # Examples
///
/// ```
/// use lumen_common::api::auth::hash_token;
///
/// let hash = hash_token("secret-token");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_token("secret-token"));
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ========================================
// Issuance
// ========================================

/// Issue a long-lived API token for a user
///
/// Returns the plaintext token; it cannot be recovered later.
pub async fn issue_api_token(pool: &SqlitePool, user_id: Uuid, label: Option<&str>) -> Result<String> {
    let token = generate_token();

    sqlx::query(
        "INSERT INTO api_tokens (token_hash, user_id, label, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(hash_token(&token))
    .bind(user_id.to_string())
    .bind(label)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Open a browser session for a user, valid for `ttl`
pub async fn create_session(pool: &SqlitePool, user_id: Uuid, ttl: Duration) -> Result<String> {
    if ttl <= Duration::zero() {
        return Err(Error::InvalidInput("session ttl must be positive".to_string()));
    }

    let token = generate_token();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(hash_token(&token))
    .bind(user_id.to_string())
    .bind(now + ttl)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token)
}

// ========================================
// Lookup
// ========================================

/// Stored credential matched by token hash
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user_id: Uuid,
    /// Sessions expire; API tokens do not
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// True if the credential has an expiry at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Find the API token matching `token`, recording its use
pub async fn find_api_token(pool: &SqlitePool, token: &str) -> Result<Option<CredentialRecord>> {
    let hash = hash_token(token);

    let row = sqlx::query("SELECT user_id FROM api_tokens WHERE token_hash = ?")
        .bind(&hash)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE token_hash = ?")
        .bind(Utc::now())
        .bind(&hash)
        .execute(pool)
        .await?;

    Ok(Some(CredentialRecord {
        user_id: parse_user_id(row.get("user_id"))?,
        expires_at: None,
    }))
}

/// Find the session matching `token` (expired sessions are returned too)
pub async fn find_session(pool: &SqlitePool, token: &str) -> Result<Option<CredentialRecord>> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(CredentialRecord {
            user_id: parse_user_id(row.get("user_id"))?,
            expires_at: Some(row.try_get("expires_at")?),
        })),
        None => Ok(None),
    }
}

/// Remove a session (logout)
pub async fn revoke_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn parse_user_id(raw: String) -> Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| Error::Internal(format!("Corrupt user id '{}': {}", raw, e)))
}

// ========================================
// Tests
// ========================================
