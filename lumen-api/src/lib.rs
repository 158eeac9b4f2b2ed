//! lumen-api library - flashlight collection service
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use lumen_common::config::LumenConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::auth::{IdentityProvider, SqliteIdentityProvider};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolves credentials to user ids
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<LumenConfig>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State using the SQLite-backed identity provider
    pub fn new(db: SqlitePool, config: LumenConfig) -> Self {
        let identity = Arc::new(SqliteIdentityProvider::new(db.clone()));
        Self::with_identity(db, identity, config)
    }

    /// State with an explicit identity provider
    pub fn with_identity(db: SqlitePool, identity: Arc<dyn IdentityProvider>, config: LumenConfig) -> Self {
        Self {
            db,
            identity,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/health` is public; every `/api/*` route requires a credential.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let body_limit = state.config.server.max_body_bytes;

    // Protected routes (require authentication)
    let protected = Router::new()
        .merge(api::flashlight_routes())
        .merge(api::bulk_routes())
        .merge(api::reference_routes())
        .merge(api::stats_routes())
        .merge(api::session_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware));

    // Public routes (no authentication)
    let public = api::health_routes();

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
