//! SeaORM entities for the purchase order reconciliation engine.
//!
//! Mirror tables (`product_variants`, `locations`, `staff_members`) shadow
//! records owned by the external platform and are maintained by the
//! existence-sync service. Everything else is owned locally.

pub mod line_item_custom_fields;
pub mod locations;
pub mod product_serials;
pub mod product_variants;
pub mod purchase_order_custom_fields;
pub mod purchase_order_employee_assignments;
pub mod purchase_order_line_items;
pub mod purchase_orders;
pub mod receipt_line_items;
pub mod receipts;
pub mod special_order_line_items;
pub mod special_orders;
pub mod staff_members;
