use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mirror of a platform staff member.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_employee_assignments::Entity")]
    EmployeeAssignments,
}

impl Related<super::purchase_order_employee_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
