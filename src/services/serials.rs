//! Serial number repository: resolves (product variant, serial) pairs to
//! local rows and reports which purchase orders already claim them. A
//! serial may only ever be received against one purchase order shop-wide.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use std::collections::{HashMap, HashSet};

use crate::{
    entities::{product_serials, purchase_order_line_items, purchase_orders},
    errors::ServiceError,
};

/// An existing claim on a serial by some purchase order's line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialClaim {
    pub product_variant_id: i64,
    pub serial: String,
    pub purchase_order_name: String,
}

/// Finds purchase orders other than `exclude_purchase_order` whose line
/// items already claim any of the given (product variant, serial) pairs.
pub async fn find_conflicting_claims<C: ConnectionTrait>(
    conn: &C,
    pairs: &[(i64, String)],
    exclude_purchase_order: Option<i64>,
) -> Result<Vec<SerialClaim>, ServiceError> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }

    let serial_strings: Vec<String> = pairs.iter().map(|(_, s)| s.clone()).collect();
    let wanted: HashSet<(i64, &str)> = pairs.iter().map(|(v, s)| (*v, s.as_str())).collect();

    let serial_rows: Vec<product_serials::Model> = product_serials::Entity::find()
        .filter(product_serials::Column::Serial.is_in(serial_strings))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .filter(|row| wanted.contains(&(row.product_variant_id, row.serial.as_str())))
        .collect();
    if serial_rows.is_empty() {
        return Ok(Vec::new());
    }

    let serial_ids: Vec<i64> = serial_rows.iter().map(|r| r.id).collect();
    let serials_by_id: HashMap<i64, &product_serials::Model> =
        serial_rows.iter().map(|r| (r.id, r)).collect();

    let mut query = purchase_order_line_items::Entity::find()
        .filter(purchase_order_line_items::Column::SerialId.is_in(serial_ids));
    if let Some(po_id) = exclude_purchase_order {
        query = query.filter(purchase_order_line_items::Column::PurchaseOrderId.ne(po_id));
    }
    let claiming_lines = query.all(conn).await.map_err(ServiceError::db_error)?;
    if claiming_lines.is_empty() {
        return Ok(Vec::new());
    }

    let po_ids: Vec<i64> = claiming_lines.iter().map(|l| l.purchase_order_id).collect();
    let po_names: HashMap<i64, String> = purchase_orders::Entity::find()
        .filter(purchase_orders::Column::Id.is_in(po_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|po| (po.id, po.name))
        .collect();

    let mut claims = Vec::new();
    for line in claiming_lines {
        let Some(serial_id) = line.serial_id else {
            continue;
        };
        let Some(serial) = serials_by_id.get(&serial_id) else {
            continue;
        };
        claims.push(SerialClaim {
            product_variant_id: serial.product_variant_id,
            serial: serial.serial.clone(),
            purchase_order_name: po_names
                .get(&line.purchase_order_id)
                .cloned()
                .unwrap_or_else(|| format!("purchase order {}", line.purchase_order_id)),
        });
    }
    Ok(claims)
}

/// Resolves a (product variant, serial) pair to its row id, creating the
/// row if it does not exist yet.
pub async fn resolve_or_create<C: ConnectionTrait>(
    conn: &C,
    product_variant_id: i64,
    serial: &str,
    location_id: Option<i64>,
) -> Result<i64, ServiceError> {
    let existing = product_serials::Entity::find()
        .filter(product_serials::Column::ProductVariantId.eq(product_variant_id))
        .filter(product_serials::Column::Serial.eq(serial))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if let Some(row) = existing {
        return Ok(row.id);
    }

    let now = Utc::now();
    let created = product_serials::ActiveModel {
        product_variant_id: Set(product_variant_id),
        serial: Set(serial.to_string()),
        location_id: Set(location_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    Ok(created.id)
}
