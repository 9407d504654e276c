//! Prometheus counters for the order workflow, exported in text format at
//! `/metrics`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        for counter in [
            &*ORDERS_CREATED,
            &*ORDER_CREATION_FAILURES,
            &*ORDERS_DELETED,
            &*DISCOUNT_VALIDATION_FAILURES,
        ] {
            if let Err(e) = registry.register(Box::new(counter.clone())) {
                error!("Failed to register metric: {}", e);
            }
        }
        registry
    };
    pub static ref ORDERS_CREATED: IntCounter =
        IntCounter::new("orders_created_total", "Total number of orders created")
            .expect("metric can be created");
    pub static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
    pub static ref ORDERS_DELETED: IntCounter =
        IntCounter::new("orders_deleted_total", "Total number of orders soft-deleted")
            .expect("metric can be created");
    pub static ref DISCOUNT_VALIDATION_FAILURES: IntCounter = IntCounter::new(
        "discount_validation_failures_total",
        "Total number of rejected discount codes"
    )
    .expect("metric can be created");
}

/// Renders every registered metric in the Prometheus text format
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub async fn metrics_handler() -> Response {
    match gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
