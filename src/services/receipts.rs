//! Receipt upsert. Receipts append to a purchase order's immutable
//! receiving history; a COMPLETED receipt moves its quantities from
//! incoming to available, and from then on only status moves between
//! COMPLETED and ARCHIVED are legal.

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{receipt_line_items, receipts},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{side_effects::SideEffectDispatcher, Identity},
    webhooks::WebhookEvent,
};

use super::purchase_orders::{
    deltas,
    dto::{ReceiptStatus, UpsertReceiptInput, UpsertReceiptResult},
    snapshot::{self, PurchaseOrderSnapshot, ReceiptSnapshot},
};

lazy_static! {
    static ref RECEIPT_UPSERTS: IntCounter = register_int_counter!(
        "receipt_upserts_total",
        "Total number of receipts saved"
    )
    .expect("metric can be created");
    static ref RECEIPT_UPSERT_FAILURES: IntCounter = register_int_counter!(
        "receipt_upsert_failures_total",
        "Total number of failed receipt saves"
    )
    .expect("metric can be created");
}

#[derive(Clone)]
pub struct ReceiptService {
    db: Arc<DatabaseConnection>,
    side_effects: SideEffectDispatcher,
    event_sender: EventSender,
}

impl ReceiptService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        side_effects: SideEffectDispatcher,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            side_effects,
            event_sender,
        }
    }

    /// Creates or updates a receipt against a purchase order, then pushes
    /// the resulting inventory deltas upstream.
    #[instrument(skip(self, identity, input), fields(purchase_order = %input.purchase_order_name))]
    pub async fn upsert_receipt(
        &self,
        identity: &Identity,
        input: UpsertReceiptInput,
    ) -> Result<UpsertReceiptResult, ServiceError> {
        let result = self.upsert_inner(identity, input).await;
        match &result {
            Ok(_) => RECEIPT_UPSERTS.inc(),
            Err(_) => RECEIPT_UPSERT_FAILURES.inc(),
        }
        result
    }

    async fn upsert_inner(
        &self,
        identity: &Identity,
        input: UpsertReceiptInput,
    ) -> Result<UpsertReceiptResult, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;

        let before = snapshot::load_by_name(&*self.db, &input.purchase_order_name)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    input.purchase_order_name
                ))
            })?;

        if let Some(location_id) = before.header.location_id {
            if !identity.may_access_location(location_id) {
                return Err(ServiceError::Forbidden(format!(
                    "staff member {} may not manage location {}",
                    identity.staff_member_id, location_id
                )));
            }
        }

        let existing = match &input.name {
            Some(name) => Some(
                before
                    .receipts
                    .iter()
                    .find(|r| &r.name == name)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Receipt {} not found on purchase order {}",
                            name, before.header.name
                        ))
                    })?,
            ),
            None => None,
        };

        validate_receipt_upsert(&input, &before, existing)?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;
        let (after, name) = persist(&txn, &input, &before, existing).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        let completed = input.status == ReceiptStatus::Completed;
        info!(receipt = %name, completed, "Receipt saved");
        self.event_sender
            .send_or_log(Event::ReceiptUpserted {
                purchase_order: before.header.name.clone(),
                receipt: name.clone(),
                completed,
            })
            .await;

        let changes = deltas::calculate_inventory_deltas(Some(&before), Some(&after));
        self.side_effects
            .run(
                &before.header.name,
                Some(&before),
                Some(&after),
                &changes,
                WebhookEvent::ReceiptUpdated {
                    purchase_order_name: before.header.name.clone(),
                    name: name.clone(),
                },
            )
            .await?;

        Ok(UpsertReceiptResult {
            purchase_order_name: before.header.name.clone(),
            name,
        })
    }
}

/// Checks an incoming receipt document against the purchase order's
/// current state. Violations are collected and reported together.
fn validate_receipt_upsert(
    input: &UpsertReceiptInput,
    po: &PurchaseOrderSnapshot,
    existing: Option<&ReceiptSnapshot>,
) -> Result<(), ServiceError> {
    let mut violations = Vec::new();

    let mut incoming: HashMap<Uuid, i64> = HashMap::new();
    for line in &input.line_items {
        if incoming.insert(line.line_item_uuid, line.quantity as i64).is_some() {
            violations.push(format!(
                "line item {} appears more than once in the receipt",
                line.line_item_uuid
            ));
        }
    }

    for (uuid, quantity) in &incoming {
        match po.line_item(*uuid) {
            None => violations.push(format!(
                "receipt references unknown line item {}",
                uuid
            )),
            Some(li) => {
                let elsewhere = match existing {
                    Some(receipt) => po.received_quantity_excluding_receipt(*uuid, receipt.id),
                    None => po.received_quantity(*uuid),
                };
                if elsewhere + quantity > li.quantity as i64 {
                    violations.push(format!(
                        "line item {} would be over-received: {} already received, {} incoming, {} ordered",
                        uuid, elsewhere, quantity, li.quantity
                    ));
                }
            }
        }
    }

    if let Some(receipt) = existing {
        if receipt.status != ReceiptStatus::Draft {
            if input.status == ReceiptStatus::Draft {
                violations.push(format!(
                    "receipt {} is completed and cannot be reopened",
                    receipt.name
                ));
            }
            let frozen: HashMap<Uuid, i64> = receipt
                .line_items
                .iter()
                .map(|l| (l.line_item_uuid, l.quantity as i64))
                .collect();
            if incoming != frozen {
                violations.push(format!(
                    "line items of completed receipt {} cannot change",
                    receipt.name
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation_batch(violations))
    }
}

async fn persist(
    txn: &DatabaseTransaction,
    input: &UpsertReceiptInput,
    before: &PurchaseOrderSnapshot,
    existing: Option<&ReceiptSnapshot>,
) -> Result<(PurchaseOrderSnapshot, String), ServiceError> {
    let po_id = before.header.id;
    let now = Utc::now();

    let (receipt_id, name) = match existing {
        Some(snapshot) => {
            let row = receipts::Entity::find_by_id(snapshot.id)
                .one(txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "receipt {} vanished mid-save",
                        snapshot.name
                    ))
                })?;
            let mut model: receipts::ActiveModel = row.into();
            model.status = Set(input.status.to_string());
            model.description = Set(input.description.clone());
            if let Some(received_at) = input.received_at {
                model.received_at = Set(received_at);
            }
            model.updated_at = Set(now);
            model.update(txn).await.map_err(ServiceError::db_error)?;
            (snapshot.id, snapshot.name.clone())
        }
        None => {
            let name = allocate_name(txn, po_id).await?;
            let row = receipts::ActiveModel {
                purchase_order_id: Set(po_id),
                name: Set(name.clone()),
                status: Set(input.status.to_string()),
                description: Set(input.description.clone()),
                received_at: Set(input.received_at.unwrap_or(now)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(ServiceError::db_error)?;
            (row.id, name)
        }
    };

    // Full-replace of the receipt's lines. For frozen receipts the
    // validator has already ensured the incoming lines are identical.
    receipt_line_items::Entity::delete_many()
        .filter(receipt_line_items::Column::ReceiptId.eq(receipt_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    for line in &input.line_items {
        receipt_line_items::ActiveModel {
            receipt_id: Set(receipt_id),
            purchase_order_id: Set(po_id),
            line_item_uuid: Set(line.line_item_uuid),
            quantity: Set(line.quantity),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;
    }

    let after = snapshot::load_by_id(txn, po_id).await?.ok_or_else(|| {
        ServiceError::InternalError(format!(
            "purchase order {} vanished mid-save",
            before.header.name
        ))
    })?;
    Ok((after, name))
}

/// Allocates the next sequential receipt name within one purchase order.
async fn allocate_name(txn: &DatabaseTransaction, po_id: i64) -> Result<String, ServiceError> {
    let count = receipts::Entity::find()
        .filter(receipts::Column::PurchaseOrderId.eq(po_id))
        .count(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("RC-#{}", count + 1))
}
