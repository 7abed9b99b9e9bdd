use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;
use uuid::Uuid;

use crate::{
    entities::{
        line_item_custom_fields, product_serials, product_variants, purchase_order_custom_fields,
        purchase_order_employee_assignments, purchase_order_line_items, purchase_orders,
        receipt_line_items, receipts, special_order_line_items, special_orders,
    },
    errors::ServiceError,
    services::purchase_orders::dto::{PurchaseOrderType, ReceiptStatus, SpecialOrderLink},
};

/// Fully detailed purchase order as read inside one transaction: header,
/// line items (with variant/special-order/serial joins), receipt history,
/// custom fields, and employee assignments. This is the unit the validator
/// and the delta calculator operate on.
#[derive(Debug, Clone)]
pub struct PurchaseOrderSnapshot {
    pub header: purchase_orders::Model,
    pub line_items: Vec<LineItemSnapshot>,
    pub receipts: Vec<ReceiptSnapshot>,
    pub custom_fields: BTreeMap<String, String>,
    pub line_item_custom_fields: HashMap<Uuid, BTreeMap<String, String>>,
    pub employee_assignments: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct LineItemSnapshot {
    pub uuid: Uuid,
    pub product_variant_id: i64,
    /// Inventory item of the variant, from the mirror row.
    pub inventory_item_id: i64,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub special_order_line_item_id: Option<i64>,
    pub special_order: Option<SpecialOrderLink>,
    pub serial_id: Option<i64>,
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReceiptSnapshot {
    pub id: i64,
    pub name: String,
    pub status: ReceiptStatus,
    pub line_items: Vec<ReceiptLineSnapshot>,
}

#[derive(Debug, Clone)]
pub struct ReceiptLineSnapshot {
    pub line_item_uuid: Uuid,
    pub quantity: i32,
}

impl PurchaseOrderSnapshot {
    pub fn po_type(&self) -> PurchaseOrderType {
        match self.header.po_type.parse() {
            Ok(po_type) => po_type,
            Err(_) => {
                warn!(
                    purchase_order = %self.header.name,
                    po_type = %self.header.po_type,
                    "unrecognized purchase order type; treating as NORMAL"
                );
                PurchaseOrderType::Normal
            }
        }
    }

    pub fn line_item(&self, uuid: Uuid) -> Option<&LineItemSnapshot> {
        self.line_items.iter().find(|li| li.uuid == uuid)
    }

    /// Total quantity received for a line item across all receipts,
    /// regardless of receipt status. This is the floor below which the
    /// line item's ordered quantity may never be set.
    pub fn received_quantity(&self, uuid: Uuid) -> i64 {
        self.receipts
            .iter()
            .flat_map(|r| r.line_items.iter())
            .filter(|l| l.line_item_uuid == uuid)
            .map(|l| l.quantity as i64)
            .sum()
    }

    /// Quantity received for a line item across all receipts except one,
    /// used when validating an edit to that receipt.
    pub fn received_quantity_excluding_receipt(&self, uuid: Uuid, receipt_id: i64) -> i64 {
        self.receipts
            .iter()
            .filter(|r| r.id != receipt_id)
            .flat_map(|r| r.line_items.iter())
            .filter(|l| l.line_item_uuid == uuid)
            .map(|l| l.quantity as i64)
            .sum()
    }

    /// Sum of incoming quantity linked to each special order line item in
    /// this snapshot, keyed by (name, uuid).
    pub fn special_order_contributions(&self) -> HashMap<SpecialOrderLink, i64> {
        let mut sums: HashMap<SpecialOrderLink, i64> = HashMap::new();
        for li in &self.line_items {
            if let Some(link) = &li.special_order {
                *sums.entry(link.clone()).or_insert(0) += li.quantity as i64;
            }
        }
        sums
    }
}

/// Loads the detailed snapshot of a purchase order by name, through the
/// supplied connection or transaction handle.
pub async fn load_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<PurchaseOrderSnapshot>, ServiceError> {
    let header = purchase_orders::Entity::find()
        .filter(purchase_orders::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    match header {
        Some(header) => load_details(conn, header).await.map(Some),
        None => Ok(None),
    }
}

/// Loads the detailed snapshot of a purchase order by id.
pub async fn load_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<Option<PurchaseOrderSnapshot>, ServiceError> {
    let header = purchase_orders::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    match header {
        Some(header) => load_details(conn, header).await.map(Some),
        None => Ok(None),
    }
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    header: purchase_orders::Model,
) -> Result<PurchaseOrderSnapshot, ServiceError> {
    let po_id = header.id;

    let rows = purchase_order_line_items::Entity::find()
        .filter(purchase_order_line_items::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let variant_ids: Vec<i64> = rows.iter().map(|r| r.product_variant_id).collect();
    let variants: HashMap<i64, product_variants::Model> = product_variants::Entity::find()
        .filter(product_variants::Column::Id.is_in(variant_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let soli_ids: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.special_order_line_item_id)
        .collect();
    let solis: HashMap<i64, special_order_line_items::Model> = if soli_ids.is_empty() {
        HashMap::new()
    } else {
        special_order_line_items::Entity::find()
            .filter(special_order_line_items::Column::Id.is_in(soli_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect()
    };
    let so_ids: Vec<i64> = solis.values().map(|s| s.special_order_id).collect();
    let special_order_names: HashMap<i64, String> = if so_ids.is_empty() {
        HashMap::new()
    } else {
        special_orders::Entity::find()
            .filter(special_orders::Column::Id.is_in(so_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect()
    };

    let serial_ids: Vec<i64> = rows.iter().filter_map(|r| r.serial_id).collect();
    let serials: HashMap<i64, String> = if serial_ids.is_empty() {
        HashMap::new()
    } else {
        product_serials::Entity::find()
            .filter(product_serials::Column::Id.is_in(serial_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, s.serial))
            .collect()
    };

    let mut line_items = Vec::with_capacity(rows.len());
    for row in &rows {
        let variant = variants.get(&row.product_variant_id).ok_or_else(|| {
            ServiceError::InternalError(format!(
                "product variant {} referenced by purchase order {} has no mirror row",
                row.product_variant_id, header.name
            ))
        })?;
        let special_order = row.special_order_line_item_id.and_then(|id| {
            let soli = solis.get(&id)?;
            let name = special_order_names.get(&soli.special_order_id)?;
            Some(SpecialOrderLink {
                name: name.clone(),
                uuid: soli.uuid,
            })
        });
        line_items.push(LineItemSnapshot {
            uuid: row.uuid,
            product_variant_id: row.product_variant_id,
            inventory_item_id: variant.inventory_item_id,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            special_order_line_item_id: row.special_order_line_item_id,
            special_order,
            serial_id: row.serial_id,
            serial_number: row.serial_id.and_then(|id| serials.get(&id).cloned()),
        });
    }

    let receipt_rows = receipts::Entity::find()
        .filter(receipts::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let receipt_line_rows = receipt_line_items::Entity::find()
        .filter(receipt_line_items::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut receipts_by_id: BTreeMap<i64, ReceiptSnapshot> = receipt_rows
        .into_iter()
        .map(|r| {
            let status = match r.status.parse() {
                Ok(status) => status,
                Err(_) => {
                    warn!(
                        purchase_order = %header.name,
                        receipt = %r.name,
                        status = %r.status,
                        "unrecognized receipt status; treating as DRAFT"
                    );
                    ReceiptStatus::Draft
                }
            };
            (
                r.id,
                ReceiptSnapshot {
                    id: r.id,
                    name: r.name,
                    status,
                    line_items: Vec::new(),
                },
            )
        })
        .collect();
    for line in receipt_line_rows {
        if let Some(receipt) = receipts_by_id.get_mut(&line.receipt_id) {
            receipt.line_items.push(ReceiptLineSnapshot {
                line_item_uuid: line.line_item_uuid,
                quantity: line.quantity,
            });
        }
    }

    let custom_fields: BTreeMap<String, String> = purchase_order_custom_fields::Entity::find()
        .filter(purchase_order_custom_fields::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|f| (f.key, f.value))
        .collect();

    let mut line_item_custom_fields: HashMap<Uuid, BTreeMap<String, String>> = HashMap::new();
    for field in line_item_custom_fields::Entity::find()
        .filter(line_item_custom_fields::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        line_item_custom_fields
            .entry(field.line_item_uuid)
            .or_default()
            .insert(field.key, field.value);
    }

    let employee_assignments: Vec<i64> = purchase_order_employee_assignments::Entity::find()
        .filter(purchase_order_employee_assignments::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|a| a.staff_member_id)
        .collect();

    Ok(PurchaseOrderSnapshot {
        header,
        line_items,
        receipts: receipts_by_id.into_values().collect(),
        custom_fields,
        line_item_custom_fields,
        employee_assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn header(po_type: &str) -> purchase_orders::Model {
        purchase_orders::Model {
            id: 1,
            name: "PO-#1".into(),
            status: "OPEN".into(),
            po_type: po_type.into(),
            vendor_name: None,
            location_id: Some(1),
            note: None,
            ship_from: None,
            ship_to: None,
            discount: None,
            tax: None,
            shipping: None,
            deposited: None,
            paid: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(po_type: &str) -> PurchaseOrderSnapshot {
        PurchaseOrderSnapshot {
            header: header(po_type),
            line_items: Vec::new(),
            receipts: Vec::new(),
            custom_fields: BTreeMap::new(),
            line_item_custom_fields: HashMap::new(),
            employee_assignments: Vec::new(),
        }
    }

    #[test]
    fn known_po_types_parse() {
        assert_eq!(snapshot("DROPSHIP").po_type(), PurchaseOrderType::Dropship);
        assert_eq!(snapshot("NORMAL").po_type(), PurchaseOrderType::Normal);
    }

    #[test]
    fn unrecognized_po_type_falls_back_to_normal() {
        // A corrupt persisted value must not silently become dropship
        // accounting; it is logged and treated as a normal order.
        assert_eq!(snapshot("BOGUS").po_type(), PurchaseOrderType::Normal);
    }
}
