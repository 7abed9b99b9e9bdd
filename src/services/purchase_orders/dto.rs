use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    #[default]
    #[strum(serialize = "OPEN")]
    Open,
    #[strum(serialize = "ORDERED")]
    Ordered,
    #[strum(serialize = "RECEIVED")]
    Received,
    #[strum(serialize = "CLOSED")]
    Closed,
}

/// Dropship purchase orders ship directly to the customer; their stock is
/// never counted as incoming at the merchant's location.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderType {
    #[default]
    #[strum(serialize = "NORMAL")]
    Normal,
    #[strum(serialize = "DROPSHIP")]
    Dropship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    #[default]
    #[strum(serialize = "DRAFT")]
    Draft,
    #[strum(serialize = "COMPLETED")]
    Completed,
    #[strum(serialize = "ARCHIVED")]
    Archived,
}

/// Reference to a special order line item by its owning order's name and
/// the line item's stable uuid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpecialOrderLink {
    pub name: String,
    pub uuid: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    /// Caller-supplied identity, stable across edits.
    pub uuid: Uuid,
    pub product_variant_id: i64,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub special_order_line_item: Option<SpecialOrderLink>,
    pub serial_number: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertPurchaseOrderInput {
    /// Absent on create; a fresh sequential name is allocated.
    pub name: Option<String>,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    #[serde(default)]
    pub po_type: PurchaseOrderType,
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
    #[serde(default)]
    pub employee_assignments: Vec<i64>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[validate]
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPurchaseOrderResult {
    pub name: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReceiptLineItemInput {
    pub line_item_uuid: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertReceiptInput {
    pub purchase_order_name: String,
    /// Absent on create; a fresh sequential name is allocated.
    pub name: Option<String>,
    #[serde(default)]
    pub status: ReceiptStatus,
    pub description: Option<String>,
    pub received_at: Option<chrono::DateTime<chrono::Utc>>,
    #[validate]
    #[serde(default)]
    pub line_items: Vec<ReceiptLineItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertReceiptResult {
    pub purchase_order_name: String,
    pub name: String,
}
