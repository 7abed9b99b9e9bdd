//! Stockroom API Library
//!
//! Purchase order reconciliation and inventory delta engine: purchase
//! order and receipt documents are validated against immutable receiving
//! history, persisted transactionally, and the before/after inventory
//! difference is pushed to the external inventory platform.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;
pub mod webhooks;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use prometheus::{Encoder, TextEncoder};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::{
    config::AppConfig,
    errors::ServiceError,
    events::EventSender,
    handlers::AppState,
    services::{
        existence_sync::ExistenceSyncService,
        inventory_sync::{HttpInventoryClient, InMemoryInventoryClient, InventoryClient},
        purchase_orders::PurchaseOrderService,
        receipts::ReceiptService,
        side_effects::SideEffectDispatcher,
    },
    webhooks::WebhookDispatcher,
};

/// Wires the service layer from configuration. Deployments without an
/// inventory API configured get the in-memory client, which keeps local
/// development self-contained.
pub fn build_state(
    config: &AppConfig,
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
) -> Result<AppState, ServiceError> {
    let inventory: Arc<dyn InventoryClient> = match &config.inventory_api_url {
        Some(url) => Arc::new(HttpInventoryClient::new(
            url.clone(),
            config.inventory_api_token.clone(),
        )?),
        None => Arc::new(InMemoryInventoryClient::new()),
    };
    let webhooks = Arc::new(WebhookDispatcher::new(
        config.webhook_url.clone(),
        config.webhook_secret.clone(),
    ));
    let side_effects = SideEffectDispatcher::new(db.clone(), inventory, webhooks);
    let existence_sync = ExistenceSyncService::new(db.clone());

    let purchase_orders = Arc::new(PurchaseOrderService::new(
        db.clone(),
        existence_sync,
        side_effects.clone(),
        event_sender.clone(),
    ));
    let receipts = Arc::new(ReceiptService::new(db, side_effects, event_sender));

    Ok(AppState {
        purchase_orders,
        receipts,
    })
}

/// Builds the full application router with middleware layers.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest(
            "/api/v1",
            handlers::purchase_orders::router().merge(handlers::receipts::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Renders the default prometheus registry in the text exposition format.
pub fn metrics_text() -> Result<String, ServiceError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding: {}", e)))
}

async fn metrics() -> Result<String, ServiceError> {
    metrics_text()
}
