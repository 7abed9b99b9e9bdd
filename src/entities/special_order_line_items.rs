use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One requested item of a special order. `quantity` is the ceiling on the
/// summed purchase-order quantity that may be linked to it across all
/// purchase orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "special_order_line_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub special_order_id: i64,
    pub uuid: Uuid,
    pub product_variant_id: i64,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::special_orders::Entity",
        from = "Column::SpecialOrderId",
        to = "super::special_orders::Column::Id"
    )]
    SpecialOrder,
    #[sea_orm(has_many = "super::purchase_order_line_items::Entity")]
    PurchaseOrderLineItems,
}

impl Related<super::special_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SpecialOrder.def()
    }
}

impl Related<super::purchase_order_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
