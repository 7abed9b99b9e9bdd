//! Post-commit side effects. Nothing here is transactional with the
//! database write: by the time this dispatcher runs, the purchase order is
//! durably saved. Each step is caught and logged independently so one
//! failing side effect cannot suppress the others. Only an upstream
//! rejection of the quantity batches is reported back to the caller, and
//! even then the local save stands.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::{
    entities::purchase_order_line_items,
    errors::ServiceError,
    services::purchase_orders::{
        deltas::{touched_inventory_item_ids, touched_product_variants, InventoryChangeSet},
        snapshot::PurchaseOrderSnapshot,
    },
    services::inventory_sync::{InventoryAdjustmentBatch, InventoryClient, InventoryCounter},
    webhooks::{WebhookDispatcher, WebhookEvent},
};

#[derive(Clone)]
pub struct SideEffectDispatcher {
    db: Arc<DatabaseConnection>,
    inventory: Arc<dyn InventoryClient>,
    webhooks: Arc<WebhookDispatcher>,
}

impl SideEffectDispatcher {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: Arc<dyn InventoryClient>,
        webhooks: Arc<WebhookDispatcher>,
    ) -> Self {
        Self {
            db,
            inventory,
            webhooks,
        }
    }

    /// Runs the full post-commit sequence: quantity batches, average cost
    /// adjustment, webhook, inventory resync.
    #[instrument(skip(self, before, after, changes, webhook_event), fields(initiator = %initiator_name))]
    pub async fn run(
        &self,
        initiator_name: &str,
        before: Option<&PurchaseOrderSnapshot>,
        after: Option<&PurchaseOrderSnapshot>,
        changes: &InventoryChangeSet,
        webhook_event: WebhookEvent,
    ) -> Result<(), ServiceError> {
        let adjust_result = self.apply_quantity_batches(initiator_name, changes).await;

        self.adjust_average_costs(before, after).await;

        self.webhooks.send_async(webhook_event);

        let touched = touched_inventory_item_ids(before, after);
        if !touched.is_empty() {
            if let Err(e) = self.inventory.resync_quantities(&touched).await {
                warn!("Inventory resync failed: {}", e);
            }
        }

        adjust_result
    }

    async fn apply_quantity_batches(
        &self,
        initiator_name: &str,
        changes: &InventoryChangeSet,
    ) -> Result<(), ServiceError> {
        let mut first_error = None;
        for (counter, deltas) in [
            (InventoryCounter::Incoming, &changes.incoming),
            (InventoryCounter::Available, &changes.available),
        ] {
            if deltas.is_empty() {
                continue;
            }
            let batch = InventoryAdjustmentBatch {
                counter,
                initiator_type: "purchase-order".to_string(),
                initiator_name: initiator_name.to_string(),
                reason: "restock".to_string(),
                changes: deltas.clone(),
            };
            if let Err(e) = self.inventory.adjust_quantities(&batch).await {
                error!(
                    counter = counter.as_str(),
                    "Inventory adjustment rejected upstream: {}", e
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Recomputes the all-time quantity-weighted average unit cost of every
    /// touched product variant and pushes it upstream. Best effort per
    /// variant.
    async fn adjust_average_costs(
        &self,
        before: Option<&PurchaseOrderSnapshot>,
        after: Option<&PurchaseOrderSnapshot>,
    ) {
        for (product_variant_id, inventory_item_id) in touched_product_variants(before, after) {
            match self.average_unit_cost(product_variant_id).await {
                Ok(Some(cost)) => {
                    if let Err(e) = self.inventory.set_unit_cost(inventory_item_id, cost).await {
                        warn!(
                            product_variant_id,
                            "Failed to push average unit cost: {}", e
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        product_variant_id,
                        "Failed to compute average unit cost: {}", e
                    );
                }
            }
        }
    }

    async fn average_unit_cost(
        &self,
        product_variant_id: i64,
    ) -> Result<Option<Decimal>, ServiceError> {
        let rows = purchase_order_line_items::Entity::find()
            .filter(purchase_order_line_items::Column::ProductVariantId.eq(product_variant_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut total_quantity = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;
        for row in rows {
            if row.quantity <= 0 {
                continue;
            }
            let quantity = Decimal::from(row.quantity);
            total_quantity += quantity;
            total_cost += row.unit_cost * quantity;
        }

        if total_quantity.is_zero() {
            Ok(None)
        } else {
            Ok(Some(total_cost / total_quantity))
        }
    }
}
