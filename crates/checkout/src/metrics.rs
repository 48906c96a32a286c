use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use prometheus_client::{
    encoding::text::encode,
    metrics::{family::Family, gauge::Gauge},
    registry::Registry,
};
use prometheus_client_derive_encode::EncodeLabelSet;
use std::sync::Arc;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StockLabels {
    pub product_id: String,
}

/// Last known stock level per product, fed by `stock.changed` events.
#[derive(Clone, Debug, Default)]
pub struct StockLevelMetrics {
    pub levels: Family<StockLabels, Gauge>,
}

impl StockLevelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "product_stock_level",
            "Current stock level per product",
            self.levels.clone(),
        );
    }

    pub fn set(&self, product_id: i32, stock: i32) {
        self.levels
            .get_or_create(&StockLabels {
                product_id: product_id.to_string(),
            })
            .set(i64::from(stock));
    }

    pub fn get(&self, product_id: i32) -> i64 {
        self.levels
            .get_or_create(&StockLabels {
                product_id: product_id.to_string(),
            })
            .get()
    }
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut buffer = String::new();

    let registry = state.registry.lock().await;

    if let Err(e) = encode(&mut buffer, &registry) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {e}"),
        )
            .into_response();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )
        .body(Body::from(buffer))
        .map(IntoResponse::into_response)
        .unwrap_or_else(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build metrics response: {e}"),
            )
                .into_response()
        })
}
