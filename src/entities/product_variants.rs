use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mirror of a platform product variant. The primary key is the external
/// platform identifier, not locally allocated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub product_id: i64,
    pub inventory_item_id: i64,
    pub sku: Option<String>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_line_items::Entity")]
    PurchaseOrderLineItems,
    #[sea_orm(has_many = "super::product_serials::Entity")]
    ProductSerials,
}

impl Related<super::purchase_order_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLineItems.def()
    }
}

impl Related<super::product_serials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSerials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
