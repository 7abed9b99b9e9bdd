use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One line of a purchase order. The caller-supplied `uuid` is stable
/// across edits and unique within its purchase order; receipt lines
/// reference it rather than the local primary key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_line_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_id: i64,
    pub uuid: Uuid,
    pub product_variant_id: i64,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub special_order_line_item_id: Option<i64>,
    pub serial_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_orders::Column::Id"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::product_variants::Entity",
        from = "Column::ProductVariantId",
        to = "super::product_variants::Column::Id"
    )]
    ProductVariant,
    #[sea_orm(
        belongs_to = "super::special_order_line_items::Entity",
        from = "Column::SpecialOrderLineItemId",
        to = "super::special_order_line_items::Column::Id"
    )]
    SpecialOrderLineItem,
    #[sea_orm(
        belongs_to = "super::product_serials::Entity",
        from = "Column::SerialId",
        to = "super::product_serials::Column::Id"
    )]
    ProductSerial,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::product_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariant.def()
    }
}

impl Related<super::special_order_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SpecialOrderLineItem.def()
    }
}

impl Related<super::product_serials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSerial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
