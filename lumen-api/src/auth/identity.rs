//! Identity provider contract and the SQLite-backed implementation

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use lumen_common::api::{find_api_token, find_session};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

/// Credential presented by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// Session token from the session cookie
    SessionCookie(String),
}

/// Authentication failure; surfaced immediately, never retried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingCredential,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired")]
    Expired,

    #[error("Authentication failed: {0}")]
    Backend(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "UNAUTHORIZED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::Expired => "SESSION_EXPIRED",
            AuthError::Backend(_) => "AUTH_BACKEND_ERROR",
        }
    }
}

/// Maps a credential to the identity of its owner
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, credential: &Credential) -> Result<Uuid, AuthError>;
}

/// Identity provider backed by the `api_tokens` and `sessions` tables
#[derive(Clone)]
pub struct SqliteIdentityProvider {
    pool: SqlitePool,
}

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn authenticate(&self, credential: &Credential) -> Result<Uuid, AuthError> {
        let record = match credential {
            Credential::Bearer(token) => find_api_token(&self.pool, token).await,
            Credential::SessionCookie(token) => find_session(&self.pool, token).await,
        }
        .map_err(|e| AuthError::Backend(e.to_string()))?;

        let record = record.ok_or(AuthError::InvalidToken)?;
        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::Expired);
        }

        Ok(record.user_id)
    }
}
