//! Shared helpers for lumen-api integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lumen_api::{build_router, AppState};
use lumen_common::api::issue_api_token;
use lumen_common::config::LumenConfig;
use lumen_common::db::{create_user, init_database};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

/// Router over a fresh database with one user and their bearer token
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub user_id: Uuid,
    pub token: String,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(LumenConfig::default()).await
    }

    pub async fn with_config(config: LumenConfig) -> Self {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let pool = init_database(&dir.path().join("lumen.db"))
            .await
            .expect("Should initialize database");
        let user = create_user(&pool, "owner@example.com")
            .await
            .expect("Should create user");
        let token = issue_api_token(&pool, user.guid, Some("tests"))
            .await
            .expect("Should issue token");

        let app = build_router(AppState::new(pool.clone(), config));

        Self {
            app,
            pool,
            user_id: user.guid,
            token,
            _dir: dir,
        }
    }

    /// Token for a second, unrelated user
    pub async fn stranger_token(&self) -> String {
        let user = create_user(&self.pool, "stranger@example.com")
            .await
            .expect("Should create user");
        issue_api_token(&self.pool, user.guid, None)
            .await
            .expect("Should issue token")
    }

    /// Authenticated request with an optional JSON body
    pub fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        request_with_token(method, uri, body, Some(&self.token))
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.expect("Should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, body)
    }

    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(self.request(method, uri, body)).await
    }
}

pub fn request_with_token(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Minimal valid flashlight input
pub fn flashlight(model: &str, manufacturer: &str) -> Value {
    serde_json::json!({
        "model": model,
        "manufacturer_name": manufacturer,
        "finish": "Black",
        "battery_type": "18650",
        "emitters": [
            {"type": "SST20", "cct": "4000K", "count": 4, "color": "White"}
        ],
        "driver": "Boost",
        "ui": "Anduril 2",
        "anduril": true,
        "form_factors": ["Tube"],
        "ip_rating": "IPX8",
        "special_features": ["Aux LEDs"],
        "notes": null,
        "purchase_date": "2024-03-01",
        "status": "Owned",
        "shipping_status": null,
    })
}
