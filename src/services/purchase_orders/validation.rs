//! Pure invariant checks run against an incoming purchase order document
//! before any write. All violations are collected and surfaced as a single
//! validation error so the client sees the full picture in one round trip.

use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::{
    errors::ServiceError,
    services::purchase_orders::{
        dto::UpsertPurchaseOrderInput, snapshot::PurchaseOrderSnapshot,
    },
};

/// Validates an incoming document against the immutable history of the
/// existing purchase order. Rules run in a fixed order; every violated
/// rule contributes one message.
pub fn validate_upsert(
    input: &UpsertPurchaseOrderInput,
    existing: Option<&PurchaseOrderSnapshot>,
) -> Result<(), ServiceError> {
    let mut violations = Vec::new();

    if input.location_id.is_none() {
        violations.push("location is required".to_string());
    }

    let mut seen = HashSet::new();
    for li in &input.line_items {
        if !seen.insert(li.uuid) {
            violations.push(format!("duplicate line item uuid {}", li.uuid));
        }
    }

    for li in &input.line_items {
        if li.quantity < 0 {
            violations.push(format!(
                "line item {} has negative quantity {}",
                li.uuid, li.quantity
            ));
        }
        if li.unit_cost < Decimal::ZERO {
            violations.push(format!(
                "line item {} has negative unit cost {}",
                li.uuid, li.unit_cost
            ));
        }
    }

    if let Some(existing) = existing {
        if let Some(previous_vendor) = &existing.header.vendor_name {
            if input.vendor_name.as_deref() != Some(previous_vendor.as_str()) {
                violations.push("vendor cannot be changed once set".to_string());
            }
        }
        if let Some(previous_location) = existing.header.location_id {
            if input.location_id != Some(previous_location) {
                violations.push("location cannot be changed once set".to_string());
            }
        }

        for existing_li in &existing.line_items {
            let received = existing.received_quantity(existing_li.uuid);
            let incoming = input.line_items.iter().find(|li| li.uuid == existing_li.uuid);

            match incoming {
                None => {
                    if received > 0 {
                        violations.push(format!(
                            "line item {} has received quantity and cannot be deleted",
                            existing_li.uuid
                        ));
                    }
                }
                Some(incoming) => {
                    if (incoming.quantity as i64) < received {
                        violations.push(format!(
                            "line item {} quantity {} is below its received quantity {}",
                            existing_li.uuid, incoming.quantity, received
                        ));
                    }
                    if received > 0 {
                        if incoming.product_variant_id != existing_li.product_variant_id {
                            violations.push(format!(
                                "line item {} has received quantity; its product variant is locked",
                                existing_li.uuid
                            ));
                        }
                        if incoming.special_order_line_item.as_ref()
                            != existing_li.special_order.as_ref()
                        {
                            violations.push(format!(
                                "line item {} has received quantity; its special order link is locked",
                                existing_li.uuid
                            ));
                        }
                    }
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation_batch(violations))
    }
}
