//! Special order repository: resolves (name, uuid) references to special
//! order line items and reports the quantity already committed against
//! them by other purchase orders. All queries take the active transaction
//! handle so the ceiling check observes the same snapshot as the
//! foreign-key resolution.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;

use crate::{
    entities::{purchase_order_line_items, special_order_line_items, special_orders},
    errors::ServiceError,
    services::purchase_orders::dto::SpecialOrderLink,
};

/// Resolves each link to its special order line item row. Every
/// unresolvable reference is a hard error, reported in one batch.
pub async fn resolve_links<C: ConnectionTrait>(
    conn: &C,
    links: &[SpecialOrderLink],
) -> Result<HashMap<SpecialOrderLink, special_order_line_items::Model>, ServiceError> {
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let names: Vec<String> = links.iter().map(|l| l.name.clone()).collect();
    let orders: HashMap<String, special_orders::Model> = special_orders::Entity::find()
        .filter(special_orders::Column::Name.is_in(names))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|so| (so.name.clone(), so))
        .collect();

    let order_ids: Vec<i64> = orders.values().map(|so| so.id).collect();
    let line_items: Vec<special_order_line_items::Model> = if order_ids.is_empty() {
        Vec::new()
    } else {
        special_order_line_items::Entity::find()
            .filter(special_order_line_items::Column::SpecialOrderId.is_in(order_ids))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?
    };

    let by_order_and_uuid: HashMap<(i64, uuid::Uuid), special_order_line_items::Model> =
        line_items
            .into_iter()
            .map(|li| ((li.special_order_id, li.uuid), li))
            .collect();

    let mut resolved = HashMap::new();
    let mut unresolved = Vec::new();
    for link in links {
        let hit = orders
            .get(&link.name)
            .and_then(|so| by_order_and_uuid.get(&(so.id, link.uuid)));
        match hit {
            Some(model) => {
                resolved.insert(link.clone(), model.clone());
            }
            None => unresolved.push(format!("{} / {}", link.name, link.uuid)),
        }
    }

    if unresolved.is_empty() {
        Ok(resolved)
    } else {
        Err(ServiceError::NotFound(format!(
            "special order line items not found: {}",
            unresolved.join(", ")
        )))
    }
}

/// Total purchase-order quantity committed against each special order line
/// item by purchase orders other than `exclude_purchase_order`.
pub async fn committed_quantities<C: ConnectionTrait>(
    conn: &C,
    line_item_ids: &[i64],
    exclude_purchase_order: Option<i64>,
) -> Result<HashMap<i64, i64>, ServiceError> {
    if line_item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query = purchase_order_line_items::Entity::find().filter(
        purchase_order_line_items::Column::SpecialOrderLineItemId.is_in(line_item_ids.to_vec()),
    );
    if let Some(po_id) = exclude_purchase_order {
        query = query.filter(purchase_order_line_items::Column::PurchaseOrderId.ne(po_id));
    }

    let rows = query.all(conn).await.map_err(ServiceError::db_error)?;

    let mut sums: HashMap<i64, i64> = HashMap::new();
    for row in rows {
        if let Some(id) = row.special_order_line_item_id {
            *sums.entry(id).or_insert(0) += row.quantity as i64;
        }
    }
    Ok(sums)
}

/// Pure ceiling check. `committed_other` is the quantity held by other
/// purchase orders (this purchase order's prior contribution already
/// excluded), so the projected total is simply `committed_other + incoming`
/// per link.
pub fn check_ceilings(
    incoming: &HashMap<SpecialOrderLink, i64>,
    committed_other: &HashMap<SpecialOrderLink, i64>,
    ceilings: &HashMap<SpecialOrderLink, i64>,
) -> Vec<String> {
    let mut violations = Vec::new();
    let mut links: Vec<&SpecialOrderLink> = incoming.keys().collect();
    links.sort();
    for link in links {
        let incoming_quantity = incoming.get(link).copied().unwrap_or(0);
        let committed = committed_other.get(link).copied().unwrap_or(0);
        let ceiling = ceilings.get(link).copied().unwrap_or(0);
        let projected = committed + incoming_quantity;
        if projected > ceiling {
            violations.push(format!(
                "special order line item {} / {} would exceed its requested quantity: {} > {}",
                link.name, link.uuid, projected, ceiling
            ));
        }
    }
    violations
}
