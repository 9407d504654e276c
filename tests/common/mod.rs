#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;

use storefront_orders::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{discount, product},
    AppState,
};

/// Helper harness for spinning up the application against an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Fresh database with the default delivery fee from configuration.
    pub async fn new() -> Self {
        let cfg = test_config();
        Self::with_config(cfg).await
    }

    /// Fresh database with a specific flat delivery fee.
    pub async fn with_delivery_fee(fee: Decimal) -> Self {
        let mut cfg = test_config();
        cfg.delivery_fee = fee;
        Self::with_config(cfg).await
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self { router, state }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, is_active: bool) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(format!("{} seeded for tests", name))),
            price: Set(price),
            is_active: Set(is_active),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_discount(
        &self,
        code: &str,
        amount: Decimal,
        is_active: bool,
        valid_until: Option<NaiveDate>,
    ) -> discount::Model {
        discount::ActiveModel {
            code: Set(code.to_string()),
            amount: Set(amount),
            is_active: Set(is_active),
            valid_until: Set(valid_until),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed discount for tests")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

/// Reads a response body as JSON, asserting the status first.
pub async fn json_body(response: axum::response::Response, expected: StatusCode) -> Value {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    assert_eq!(
        status,
        expected,
        "unexpected status, body: {}",
        String::from_utf8_lossy(&bytes)
    );
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// Money fields are serialized as strings; compare them numerically.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a money value, got {other}"),
    }
}
