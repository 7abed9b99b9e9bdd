//! Inventory delta calculator: pure before/after comparison of detailed
//! purchase order snapshots, producing per-(location, inventory item)
//! changes for the `incoming` and `available` counters.
//!
//! `before` contributes with factor -1 and `after` with factor +1. A
//! DROPSHIP purchase order contributes nothing to `incoming` in either
//! direction. `available` is derived from non-draft receipts (ARCHIVED is a
//! presentation state for a COMPLETED receipt and still counts), with
//! each receipt line resolved back to its purchase order line item; a
//! receipt line whose uuid no longer resolves is a data-integrity anomaly
//! that is logged and skipped rather than failing the save.

use std::collections::BTreeMap;
use std::collections::HashSet;
use tracing::warn;

use crate::services::purchase_orders::{
    dto::{PurchaseOrderType, ReceiptStatus},
    snapshot::PurchaseOrderSnapshot,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InventoryDelta {
    pub location_id: i64,
    pub inventory_item_id: i64,
    pub delta: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryChangeSet {
    pub incoming: Vec<InventoryDelta>,
    pub available: Vec<InventoryDelta>,
}

impl InventoryChangeSet {
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.available.is_empty()
    }
}

pub fn calculate_inventory_deltas(
    before: Option<&PurchaseOrderSnapshot>,
    after: Option<&PurchaseOrderSnapshot>,
) -> InventoryChangeSet {
    let mut incoming: BTreeMap<(i64, i64), i64> = BTreeMap::new();
    let mut available: BTreeMap<(i64, i64), i64> = BTreeMap::new();

    if let Some(snapshot) = before {
        accumulate(snapshot, -1, &mut incoming, &mut available);
    }
    if let Some(snapshot) = after {
        accumulate(snapshot, 1, &mut incoming, &mut available);
    }

    InventoryChangeSet {
        incoming: flatten(incoming),
        available: flatten(available),
    }
}

/// Inventory item ids touched by either snapshot, for the post-commit
/// resync.
pub fn touched_inventory_item_ids(
    before: Option<&PurchaseOrderSnapshot>,
    after: Option<&PurchaseOrderSnapshot>,
) -> Vec<i64> {
    let mut ids: HashSet<i64> = HashSet::new();
    for snapshot in [before, after].into_iter().flatten() {
        for li in &snapshot.line_items {
            ids.insert(li.inventory_item_id);
        }
    }
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids
}

/// (product_variant_id, inventory_item_id) pairs touched by either
/// snapshot, for the average-cost adjustment.
pub fn touched_product_variants(
    before: Option<&PurchaseOrderSnapshot>,
    after: Option<&PurchaseOrderSnapshot>,
) -> Vec<(i64, i64)> {
    let mut pairs: HashSet<(i64, i64)> = HashSet::new();
    for snapshot in [before, after].into_iter().flatten() {
        for li in &snapshot.line_items {
            pairs.insert((li.product_variant_id, li.inventory_item_id));
        }
    }
    let mut pairs: Vec<(i64, i64)> = pairs.into_iter().collect();
    pairs.sort_unstable();
    pairs
}

fn accumulate(
    snapshot: &PurchaseOrderSnapshot,
    factor: i64,
    incoming: &mut BTreeMap<(i64, i64), i64>,
    available: &mut BTreeMap<(i64, i64), i64>,
) {
    // No location means the document cannot count against any counter.
    let Some(location_id) = snapshot.header.location_id else {
        return;
    };

    if snapshot.po_type() != PurchaseOrderType::Dropship {
        for li in &snapshot.line_items {
            *incoming
                .entry((location_id, li.inventory_item_id))
                .or_insert(0) += li.quantity as i64 * factor;
        }
    }

    for receipt in &snapshot.receipts {
        if receipt.status == ReceiptStatus::Draft {
            continue;
        }
        for line in &receipt.line_items {
            match snapshot.line_item(line.line_item_uuid) {
                Some(li) => {
                    *available
                        .entry((location_id, li.inventory_item_id))
                        .or_insert(0) += line.quantity as i64 * factor;
                }
                None => {
                    warn!(
                        purchase_order = %snapshot.header.name,
                        receipt = %receipt.name,
                        line_item_uuid = %line.line_item_uuid,
                        "receipt line references an unknown line item; skipping"
                    );
                }
            }
        }
    }
}

fn flatten(accumulator: BTreeMap<(i64, i64), i64>) -> Vec<InventoryDelta> {
    accumulator
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|((location_id, inventory_item_id), delta)| InventoryDelta {
            location_id,
            inventory_item_id,
            delta,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::purchase_orders;
    use crate::services::purchase_orders::dto::PurchaseOrderStatus;
    use crate::services::purchase_orders::snapshot::{
        LineItemSnapshot, ReceiptLineSnapshot, ReceiptSnapshot,
    };
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap as Map, HashMap};
    use uuid::Uuid;

    fn snapshot(
        po_type: PurchaseOrderType,
        location_id: Option<i64>,
        lines: Vec<(Uuid, i64, i32)>,
        completed_receipts: Vec<(Uuid, i32)>,
    ) -> PurchaseOrderSnapshot {
        PurchaseOrderSnapshot {
            header: purchase_orders::Model {
                id: 1,
                name: "PO-#1".into(),
                status: PurchaseOrderStatus::Open.to_string(),
                po_type: po_type.to_string(),
                vendor_name: None,
                location_id,
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
            },
            line_items: lines
                .into_iter()
                .map(|(uuid, inventory_item_id, quantity)| LineItemSnapshot {
                    uuid,
                    product_variant_id: inventory_item_id - 1000,
                    inventory_item_id,
                    quantity,
                    unit_cost: dec!(5.00),
                    special_order_line_item_id: None,
                    special_order: None,
                    serial_id: None,
                    serial_number: None,
                })
                .collect(),
            receipts: vec![ReceiptSnapshot {
                id: 1,
                name: "RC-#1".into(),
                status: ReceiptStatus::Completed,
                line_items: completed_receipts
                    .into_iter()
                    .map(|(line_item_uuid, quantity)| ReceiptLineSnapshot {
                        line_item_uuid,
                        quantity,
                    })
                    .collect(),
            }],
            custom_fields: Map::new(),
            line_item_custom_fields: HashMap::new(),
            employee_assignments: Vec::new(),
        }
    }

    #[test]
    fn create_counts_full_quantity_as_incoming() {
        let uuid = Uuid::new_v4();
        let after = snapshot(PurchaseOrderType::Normal, Some(7), vec![(uuid, 1001, 10)], vec![]);
        let changes = calculate_inventory_deltas(None, Some(&after));
        assert_eq!(
            changes.incoming,
            vec![InventoryDelta {
                location_id: 7,
                inventory_item_id: 1001,
                delta: 10
            }]
        );
        assert!(changes.available.is_empty());
    }

    #[test]
    fn completed_receipt_counts_as_available() {
        let uuid = Uuid::new_v4();
        let before = snapshot(PurchaseOrderType::Normal, Some(7), vec![(uuid, 1001, 10)], vec![]);
        let after = snapshot(
            PurchaseOrderType::Normal,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4)],
        );
        let changes = calculate_inventory_deltas(Some(&before), Some(&after));
        // The receipt changes available only; incoming cancels out.
        assert!(changes.incoming.is_empty());
        assert_eq!(
            changes.available,
            vec![InventoryDelta {
                location_id: 7,
                inventory_item_id: 1001,
                delta: 4
            }]
        );
    }

    #[test]
    fn draft_receipts_do_not_count_as_available() {
        let uuid = Uuid::new_v4();
        let mut after = snapshot(
            PurchaseOrderType::Normal,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4)],
        );
        after.receipts[0].status = ReceiptStatus::Draft;
        let changes = calculate_inventory_deltas(None, Some(&after));
        assert!(changes.available.is_empty());
    }

    #[test]
    fn archiving_a_completed_receipt_changes_nothing() {
        let uuid = Uuid::new_v4();
        let before = snapshot(
            PurchaseOrderType::Normal,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4)],
        );
        let mut after = before.clone();
        after.receipts[0].status = ReceiptStatus::Archived;
        // Archived receipts still count as received and available.
        let changes = calculate_inventory_deltas(Some(&before), Some(&after));
        assert!(changes.is_empty());
    }

    #[test]
    fn dropship_contributes_nothing_to_incoming() {
        let uuid = Uuid::new_v4();
        let after = snapshot(
            PurchaseOrderType::Dropship,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4)],
        );
        let changes = calculate_inventory_deltas(None, Some(&after));
        assert!(changes.incoming.is_empty());
        // Received dropship stock still lands in available.
        assert_eq!(changes.available[0].delta, 4);
    }

    #[test]
    fn flipping_to_dropship_recounts_all_existing_quantity() {
        let uuid = Uuid::new_v4();
        let before = snapshot(PurchaseOrderType::Normal, Some(7), vec![(uuid, 1001, 10)], vec![]);
        let after = snapshot(PurchaseOrderType::Dropship, Some(7), vec![(uuid, 1001, 10)], vec![]);
        let changes = calculate_inventory_deltas(Some(&before), Some(&after));
        // Full snapshot diff: the whole quantity leaves incoming, not just
        // newly added units.
        assert_eq!(
            changes.incoming,
            vec![InventoryDelta {
                location_id: 7,
                inventory_item_id: 1001,
                delta: -10
            }]
        );
    }

    #[test]
    fn unresolvable_receipt_line_is_skipped() {
        let uuid = Uuid::new_v4();
        let stray = Uuid::new_v4();
        let after = snapshot(
            PurchaseOrderType::Normal,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4), (stray, 99)],
        );
        let changes = calculate_inventory_deltas(None, Some(&after));
        assert_eq!(changes.available.len(), 1);
        assert_eq!(changes.available[0].delta, 4);
    }

    #[test]
    fn missing_location_contributes_nothing() {
        let uuid = Uuid::new_v4();
        let after = snapshot(PurchaseOrderType::Normal, None, vec![(uuid, 1001, 10)], vec![]);
        let changes = calculate_inventory_deltas(None, Some(&after));
        assert!(changes.is_empty());
    }

    #[test]
    fn identical_snapshots_cancel_out() {
        let uuid = Uuid::new_v4();
        let snap = snapshot(
            PurchaseOrderType::Normal,
            Some(7),
            vec![(uuid, 1001, 10)],
            vec![(uuid, 4)],
        );
        let changes = calculate_inventory_deltas(Some(&snap), Some(&snap));
        assert!(changes.is_empty());
    }

    proptest! {
        /// Deleting a purchase order (a before-only transition) always
        /// yields the exact negation of creating it.
        #[test]
        fn deletion_negates_creation(
            quantities in proptest::collection::vec((1i64..5, 0i32..50, 0i32..50), 1..6),
            dropship in any::<bool>(),
        ) {
            let lines: Vec<(Uuid, i64, i32)> = quantities
                .iter()
                .map(|(item, qty, _)| (Uuid::new_v4(), 1000 + item, *qty))
                .collect();
            let receipts: Vec<(Uuid, i32)> = lines
                .iter()
                .zip(quantities.iter())
                .map(|((uuid, _, qty), (_, _, received))| (*uuid, (*received).min(*qty)))
                .filter(|(_, qty)| *qty > 0)
                .collect();
            let po_type = if dropship {
                PurchaseOrderType::Dropship
            } else {
                PurchaseOrderType::Normal
            };
            let snap = snapshot(po_type, Some(3), lines, receipts);

            let created = calculate_inventory_deltas(None, Some(&snap));
            let deleted = calculate_inventory_deltas(Some(&snap), None);

            let negate = |deltas: &[InventoryDelta]| -> Vec<InventoryDelta> {
                deltas
                    .iter()
                    .map(|d| InventoryDelta { delta: -d.delta, ..d.clone() })
                    .collect()
            };
            prop_assert_eq!(negate(&created.incoming), deleted.incoming);
            prop_assert_eq!(negate(&created.available), deleted.available);
        }
    }
}
