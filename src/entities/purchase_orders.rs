use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique document name, e.g. "PO-#42".
    #[sea_orm(unique)]
    pub name: String,
    pub status: String,
    /// "NORMAL" or "DROPSHIP". Dropship stock never counts as incoming.
    pub po_type: String,
    /// Immutable once set while line items exist.
    pub vendor_name: Option<String>,
    /// Immutable once set.
    pub location_id: Option<i64>,
    pub note: Option<String>,
    pub ship_from: Option<String>,
    pub ship_to: Option<String>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub deposited: Option<Decimal>,
    pub paid: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::purchase_order_line_items::Entity")]
    LineItems,
    #[sea_orm(has_many = "super::receipts::Entity")]
    Receipts,
    #[sea_orm(has_many = "super::purchase_order_custom_fields::Entity")]
    CustomFields,
    #[sea_orm(has_many = "super::purchase_order_employee_assignments::Entity")]
    EmployeeAssignments,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::purchase_order_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl Related<super::purchase_order_custom_fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomFields.def()
    }
}

impl Related<super::purchase_order_employee_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
