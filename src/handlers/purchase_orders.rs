use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::purchase_orders::{
        dto::{SpecialOrderLink, UpsertPurchaseOrderInput, UpsertPurchaseOrderResult},
        snapshot::PurchaseOrderSnapshot,
    },
    services::Identity,
};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders", post(upsert_purchase_order).get(list_purchase_orders))
        .route("/purchase-orders/:name", get(get_purchase_order))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    50
}

#[derive(Debug, Serialize)]
struct ListResponse {
    purchase_orders: Vec<crate::entities::purchase_orders::Model>,
    total: u64,
    page: u64,
    limit: u64,
}

/// Detailed purchase order view returned to API consumers.
#[derive(Debug, Serialize)]
pub struct PurchaseOrderResponse {
    pub name: String,
    pub status: String,
    pub po_type: String,
    pub vendor_name: Option<String>,
    pub location_id: Option<i64>,
    pub note: Option<String>,
    pub ship_from: Option<String>,
    pub ship_to: Option<String>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub deposited: Option<Decimal>,
    pub paid: Option<Decimal>,
    pub custom_fields: BTreeMap<String, String>,
    pub employee_assignments: Vec<i64>,
    pub line_items: Vec<LineItemResponse>,
    pub receipts: Vec<ReceiptResponse>,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub uuid: Uuid,
    pub product_variant_id: i64,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub received_quantity: i64,
    pub special_order_line_item: Option<SpecialOrderLink>,
    pub serial_number: Option<String>,
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub name: String,
    pub status: String,
    pub line_items: Vec<ReceiptLineResponse>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptLineResponse {
    pub line_item_uuid: Uuid,
    pub quantity: i32,
}

impl From<PurchaseOrderSnapshot> for PurchaseOrderResponse {
    fn from(snapshot: PurchaseOrderSnapshot) -> Self {
        let line_items = snapshot
            .line_items
            .iter()
            .map(|li| LineItemResponse {
                uuid: li.uuid,
                product_variant_id: li.product_variant_id,
                quantity: li.quantity,
                unit_cost: li.unit_cost,
                received_quantity: snapshot.received_quantity(li.uuid),
                special_order_line_item: li.special_order.clone(),
                serial_number: li.serial_number.clone(),
                custom_fields: snapshot
                    .line_item_custom_fields
                    .get(&li.uuid)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();
        let receipts = snapshot
            .receipts
            .iter()
            .map(|r| ReceiptResponse {
                name: r.name.clone(),
                status: r.status.to_string(),
                line_items: r
                    .line_items
                    .iter()
                    .map(|l| ReceiptLineResponse {
                        line_item_uuid: l.line_item_uuid,
                        quantity: l.quantity,
                    })
                    .collect(),
            })
            .collect();
        Self {
            name: snapshot.header.name,
            status: snapshot.header.status,
            po_type: snapshot.header.po_type,
            vendor_name: snapshot.header.vendor_name,
            location_id: snapshot.header.location_id,
            note: snapshot.header.note,
            ship_from: snapshot.header.ship_from,
            ship_to: snapshot.header.ship_to,
            discount: snapshot.header.discount,
            tax: snapshot.header.tax,
            shipping: snapshot.header.shipping,
            deposited: snapshot.header.deposited,
            paid: snapshot.header.paid,
            custom_fields: snapshot.custom_fields,
            employee_assignments: snapshot.employee_assignments,
            line_items,
            receipts,
        }
    }
}

async fn upsert_purchase_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(input): Json<UpsertPurchaseOrderInput>,
) -> Result<(StatusCode, Json<UpsertPurchaseOrderResult>), ServiceError> {
    let result = state.purchase_orders.upsert_purchase_order(&identity, input).await?;
    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

async fn get_purchase_order(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PurchaseOrderResponse>, ServiceError> {
    let snapshot = state.purchase_orders.get_purchase_order(&name).await?;
    Ok(Json(snapshot.into()))
}

async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ServiceError> {
    let (purchase_orders, total) = state
        .purchase_orders
        .list_purchase_orders(query.page, query.limit)
        .await?;
    Ok(Json(ListResponse {
        purchase_orders,
        total,
        page: query.page,
        limit: query.limit,
    }))
}
