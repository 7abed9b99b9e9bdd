//! Purchase order upsert: invariant validation, transactional
//! persistence, and post-commit inventory synchronization.

pub mod deltas;
pub mod diff;
pub mod dto;
pub mod snapshot;
pub mod validation;

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        line_item_custom_fields, purchase_order_custom_fields,
        purchase_order_employee_assignments, purchase_order_line_items, purchase_orders,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        serials, side_effects::SideEffectDispatcher, special_orders, Identity,
        existence_sync::ExistenceSyncService,
    },
    webhooks::WebhookEvent,
};

use dto::{
    LineItemInput, SpecialOrderLink, UpsertPurchaseOrderInput, UpsertPurchaseOrderResult,
};
use snapshot::PurchaseOrderSnapshot;

lazy_static! {
    static ref PO_UPSERTS: IntCounter = register_int_counter!(
        "purchase_order_upserts_total",
        "Total number of purchase orders saved"
    )
    .expect("metric can be created");
    static ref PO_UPSERT_FAILURES: IntCounter = register_int_counter!(
        "purchase_order_upsert_failures_total",
        "Total number of failed purchase order saves"
    )
    .expect("metric can be created");
}

/// Service for saving purchase orders and reconciling their inventory
/// impact.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    existence_sync: ExistenceSyncService,
    side_effects: SideEffectDispatcher,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        existence_sync: ExistenceSyncService,
        side_effects: SideEffectDispatcher,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            existence_sync,
            side_effects,
            event_sender,
        }
    }

    /// Creates or updates a purchase order from an incoming document.
    ///
    /// The incoming document is validated against the existing purchase
    /// order's immutable history, persisted in one transaction, and the
    /// resulting inventory deltas are pushed upstream after commit.
    #[instrument(skip(self, identity, input), fields(name = input.name.as_deref().unwrap_or("<new>")))]
    pub async fn upsert_purchase_order(
        &self,
        identity: &Identity,
        input: UpsertPurchaseOrderInput,
    ) -> Result<UpsertPurchaseOrderResult, ServiceError> {
        let result = self.upsert_inner(identity, input).await;
        match &result {
            Ok(_) => PO_UPSERTS.inc(),
            Err(_) => PO_UPSERT_FAILURES.inc(),
        }
        result
    }

    async fn upsert_inner(
        &self,
        identity: &Identity,
        input: UpsertPurchaseOrderInput,
    ) -> Result<UpsertPurchaseOrderResult, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;

        if let Some(location_id) = input.location_id {
            if !identity.may_access_location(location_id) {
                return Err(ServiceError::Forbidden(format!(
                    "staff member {} may not manage location {}",
                    identity.staff_member_id, location_id
                )));
            }
        }

        // Fresh read of the existing state for this request.
        let existing = match &input.name {
            Some(name) => Some(
                snapshot::load_by_name(&*self.db, name)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Purchase order {} not found", name))
                    })?,
            ),
            None => None,
        };

        // Mirror rows for every referenced platform entity must exist
        // before the transaction references them by foreign key.
        let variant_ids: Vec<i64> = input
            .line_items
            .iter()
            .map(|li| li.product_variant_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let location_ids: Vec<i64> = input.location_id.into_iter().collect();
        self.existence_sync
            .sync_references(&variant_ids, &location_ids, &input.employee_assignments)
            .await?;

        validation::validate_upsert(&input, existing.as_ref())?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;
        let (after, name, created) = self.persist(&txn, &input, existing.as_ref()).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(purchase_order = %name, created, "Purchase order saved");
        let event = if created {
            Event::PurchaseOrderCreated { name: name.clone() }
        } else {
            Event::PurchaseOrderUpdated { name: name.clone() }
        };
        self.event_sender.send_or_log(event).await;

        let changes = deltas::calculate_inventory_deltas(existing.as_ref(), Some(&after));
        self.side_effects
            .run(
                &name,
                existing.as_ref(),
                Some(&after),
                &changes,
                WebhookEvent::PurchaseOrderUpdated { name: name.clone() },
            )
            .await?;

        Ok(UpsertPurchaseOrderResult { name, created })
    }

    /// All writes for one upsert, executed against one transaction
    /// handle. Any error rolls the whole unit back.
    async fn persist(
        &self,
        txn: &DatabaseTransaction,
        input: &UpsertPurchaseOrderInput,
        existing: Option<&PurchaseOrderSnapshot>,
    ) -> Result<(PurchaseOrderSnapshot, String, bool), ServiceError> {
        let created = existing.is_none();
        let name = match existing {
            Some(snapshot) => snapshot.header.name.clone(),
            None => allocate_name(txn).await?,
        };

        let now = Utc::now();
        let po_id = match existing {
            Some(snapshot) => {
                let mut header: purchase_orders::ActiveModel = snapshot.header.clone().into();
                header.status = Set(input.status.to_string());
                header.po_type = Set(input.po_type.to_string());
                header.vendor_name = Set(input.vendor_name.clone());
                header.location_id = Set(input.location_id);
                header.note = Set(input.note.clone());
                header.ship_from = Set(input.ship_from.clone());
                header.ship_to = Set(input.ship_to.clone());
                header.discount = Set(input.discount);
                header.tax = Set(input.tax);
                header.shipping = Set(input.shipping);
                header.deposited = Set(input.deposited);
                header.paid = Set(input.paid);
                header.updated_at = Set(now);
                header.update(txn).await.map_err(ServiceError::db_error)?;
                snapshot.header.id
            }
            None => {
                let header = purchase_orders::ActiveModel {
                    name: Set(name.clone()),
                    status: Set(input.status.to_string()),
                    po_type: Set(input.po_type.to_string()),
                    vendor_name: Set(input.vendor_name.clone()),
                    location_id: Set(input.location_id),
                    note: Set(input.note.clone()),
                    ship_from: Set(input.ship_from.clone()),
                    ship_to: Set(input.ship_to.clone()),
                    discount: Set(input.discount),
                    tax: Set(input.tax),
                    shipping: Set(input.shipping),
                    deposited: Set(input.deposited),
                    paid: Set(input.paid),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                header.insert(txn).await.map_err(ServiceError::db_error)?.id
            }
        };

        let special_order_ids = self
            .reconcile_special_orders(txn, input, existing, po_id)
            .await?;
        let serial_ids = self
            .check_and_resolve_serials(txn, input, existing, po_id)
            .await?;

        let empty: Vec<snapshot::LineItemSnapshot> = Vec::new();
        let existing_lines = existing.map(|s| s.line_items.as_slice()).unwrap_or(&empty);
        let diff = diff::diff_line_items(&input.line_items, existing_lines);

        if !diff.deletes.is_empty() {
            purchase_order_line_items::Entity::delete_many()
                .filter(purchase_order_line_items::Column::PurchaseOrderId.eq(po_id))
                .filter(purchase_order_line_items::Column::Uuid.is_in(diff.deletes.clone()))
                .exec(txn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        let current_rows: HashMap<Uuid, purchase_order_line_items::Model> =
            purchase_order_line_items::Entity::find()
                .filter(purchase_order_line_items::Column::PurchaseOrderId.eq(po_id))
                .all(txn)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|row| (row.uuid, row))
                .collect();

        for li in &diff.updates {
            let row = current_rows.get(&li.uuid).ok_or_else(|| {
                ServiceError::InternalError(format!("line item {} vanished mid-save", li.uuid))
            })?;
            let mut model: purchase_order_line_items::ActiveModel = row.clone().into();
            model.product_variant_id = Set(li.product_variant_id);
            model.quantity = Set(li.quantity);
            model.unit_cost = Set(li.unit_cost);
            model.special_order_line_item_id = Set(special_order_line_item_id(li, &special_order_ids));
            model.serial_id = Set(serial_ids.get(&li.uuid).copied());
            model.updated_at = Set(now);
            model.update(txn).await.map_err(ServiceError::db_error)?;
        }

        for li in &diff.inserts {
            let model = purchase_order_line_items::ActiveModel {
                purchase_order_id: Set(po_id),
                uuid: Set(li.uuid),
                product_variant_id: Set(li.product_variant_id),
                quantity: Set(li.quantity),
                unit_cost: Set(li.unit_cost),
                special_order_line_item_id: Set(special_order_line_item_id(li, &special_order_ids)),
                serial_id: Set(serial_ids.get(&li.uuid).copied()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            model.insert(txn).await.map_err(ServiceError::db_error)?;
        }

        self.replace_custom_fields_and_assignments(txn, input, po_id)
            .await?;

        let after = snapshot::load_by_id(txn, po_id).await?.ok_or_else(|| {
            ServiceError::InternalError(format!("purchase order {} vanished mid-save", name))
        })?;
        Ok((after, name, created))
    }

    /// Resolves every special order reference and enforces each referenced
    /// line item's quantity ceiling across all purchase orders. Uses the
    /// same transaction snapshot as the foreign-key resolution.
    async fn reconcile_special_orders(
        &self,
        txn: &DatabaseTransaction,
        input: &UpsertPurchaseOrderInput,
        existing: Option<&PurchaseOrderSnapshot>,
        po_id: i64,
    ) -> Result<HashMap<SpecialOrderLink, i64>, ServiceError> {
        let links: Vec<SpecialOrderLink> = input
            .line_items
            .iter()
            .filter_map(|li| li.special_order_line_item.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let resolved = special_orders::resolve_links(txn, &links).await?;

        let mut incoming: HashMap<SpecialOrderLink, i64> = HashMap::new();
        for li in &input.line_items {
            if let Some(link) = &li.special_order_line_item {
                *incoming.entry(link.clone()).or_insert(0) += li.quantity as i64;
            }
        }

        let line_item_ids: Vec<i64> = resolved.values().map(|m| m.id).collect();
        let exclude = existing.map(|s| s.header.id).unwrap_or(po_id);
        let committed_by_id =
            special_orders::committed_quantities(txn, &line_item_ids, Some(exclude)).await?;

        let mut committed: HashMap<SpecialOrderLink, i64> = HashMap::new();
        let mut ceilings: HashMap<SpecialOrderLink, i64> = HashMap::new();
        for (link, model) in &resolved {
            committed.insert(
                link.clone(),
                committed_by_id.get(&model.id).copied().unwrap_or(0),
            );
            ceilings.insert(link.clone(), model.quantity as i64);
        }

        let violations = special_orders::check_ceilings(&incoming, &committed, &ceilings);
        if !violations.is_empty() {
            return Err(ServiceError::validation_batch(violations));
        }

        Ok(resolved.into_iter().map(|(link, m)| (link, m.id)).collect())
    }

    /// Serial uniqueness: a (product variant, serial) pair newly added to
    /// this document must not be claimed by any other purchase order.
    /// Serials on surviving line items are not re-checked; they cannot
    /// change once the line item has received quantity.
    async fn check_and_resolve_serials(
        &self,
        txn: &DatabaseTransaction,
        input: &UpsertPurchaseOrderInput,
        existing: Option<&PurchaseOrderSnapshot>,
        po_id: i64,
    ) -> Result<HashMap<Uuid, i64>, ServiceError> {
        let existing_uuids: HashSet<Uuid> = existing
            .map(|s| s.line_items.iter().map(|li| li.uuid).collect())
            .unwrap_or_default();

        let new_pairs: Vec<(i64, String)> = input
            .line_items
            .iter()
            .filter(|li| !existing_uuids.contains(&li.uuid))
            .filter_map(|li| {
                li.serial_number
                    .as_ref()
                    .map(|s| (li.product_variant_id, s.clone()))
            })
            .collect();

        let claims = serials::find_conflicting_claims(txn, &new_pairs, Some(po_id)).await?;
        if !claims.is_empty() {
            let messages: Vec<String> = claims
                .iter()
                .map(|c| {
                    format!(
                        "serial {} for product variant {} is already claimed by {}",
                        c.serial, c.product_variant_id, c.purchase_order_name
                    )
                })
                .collect();
            return Err(ServiceError::validation_batch(messages));
        }

        let mut serial_ids = HashMap::new();
        for li in &input.line_items {
            if let Some(serial) = &li.serial_number {
                let id = serials::resolve_or_create(
                    txn,
                    li.product_variant_id,
                    serial,
                    input.location_id,
                )
                .await?;
                serial_ids.insert(li.uuid, id);
            }
        }
        Ok(serial_ids)
    }

    /// Custom fields and employee assignments carry full-replace
    /// semantics: delete everything, reinsert from the incoming document.
    async fn replace_custom_fields_and_assignments(
        &self,
        txn: &DatabaseTransaction,
        input: &UpsertPurchaseOrderInput,
        po_id: i64,
    ) -> Result<(), ServiceError> {
        purchase_order_custom_fields::Entity::delete_many()
            .filter(purchase_order_custom_fields::Column::PurchaseOrderId.eq(po_id))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        for (key, value) in &input.custom_fields {
            purchase_order_custom_fields::ActiveModel {
                purchase_order_id: Set(po_id),
                key: Set(key.clone()),
                value: Set(value.clone()),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(ServiceError::db_error)?;
        }

        line_item_custom_fields::Entity::delete_many()
            .filter(line_item_custom_fields::Column::PurchaseOrderId.eq(po_id))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        for li in &input.line_items {
            for (key, value) in &li.custom_fields {
                line_item_custom_fields::ActiveModel {
                    purchase_order_id: Set(po_id),
                    line_item_uuid: Set(li.uuid),
                    key: Set(key.clone()),
                    value: Set(value.clone()),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(ServiceError::db_error)?;
            }
        }

        purchase_order_employee_assignments::Entity::delete_many()
            .filter(purchase_order_employee_assignments::Column::PurchaseOrderId.eq(po_id))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        for staff_member_id in &input.employee_assignments {
            purchase_order_employee_assignments::ActiveModel {
                purchase_order_id: Set(po_id),
                staff_member_id: Set(*staff_member_id),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(ServiceError::db_error)?;
        }

        Ok(())
    }

    /// Detailed read model for API consumers.
    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        name: &str,
    ) -> Result<PurchaseOrderSnapshot, ServiceError> {
        snapshot::load_by_name(&*self.db, name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", name)))
    }

    /// Lists purchase order headers with pagination.
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<purchase_orders::Model>, u64), ServiceError> {
        let paginator = purchase_orders::Entity::find().paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}

fn special_order_line_item_id(
    li: &LineItemInput,
    resolved: &HashMap<SpecialOrderLink, i64>,
) -> Option<i64> {
    li.special_order_line_item
        .as_ref()
        .and_then(|link| resolved.get(link).copied())
}

/// Allocates the next sequential purchase order name. The unique index on
/// `name` backstops concurrent allocation.
async fn allocate_name(txn: &DatabaseTransaction) -> Result<String, ServiceError> {
    let count = purchase_orders::Entity::find()
        .count(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(format!("PO-#{}", count + 1))
}
