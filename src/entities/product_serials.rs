use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A serial number for a product variant. The (product_variant_id, serial)
/// pair is unique shop-wide; at most one purchase order line item may
/// reference it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_serials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_variant_id: i64,
    pub serial: String,
    pub location_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_variants::Entity",
        from = "Column::ProductVariantId",
        to = "super::product_variants::Column::Id"
    )]
    ProductVariant,
    #[sea_orm(has_many = "super::purchase_order_line_items::Entity")]
    PurchaseOrderLineItems,
}

impl Related<super::product_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariant.def()
    }
}

impl Related<super::purchase_order_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
