//! Shared harness: migrated in-memory SQLite, seeded mirror rows, and the
//! full service stack wired to a recording in-memory inventory client.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

use stockroom_api::{
    entities::{locations, product_variants, special_order_line_items, special_orders, staff_members},
    events::{event_channel, EventSender},
    migrator::Migrator,
    services::{
        existence_sync::ExistenceSyncService,
        inventory_sync::{InMemoryInventoryClient, InventoryClient},
        purchase_orders::PurchaseOrderService,
        receipts::ReceiptService,
        side_effects::SideEffectDispatcher,
    },
    webhooks::WebhookDispatcher,
};
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub purchase_orders: PurchaseOrderService,
    pub receipts: ReceiptService,
    pub inventory: Arc<InMemoryInventoryClient>,
    // Held so service event sends do not fail mid-test.
    _event_rx: tokio::sync::mpsc::Receiver<stockroom_api::events::Event>,
}

pub async fn spawn_app() -> TestApp {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    let db = Arc::new(db);

    let inventory = Arc::new(InMemoryInventoryClient::new());
    let inventory_dyn: Arc<dyn InventoryClient> = inventory.clone();
    let webhooks = Arc::new(WebhookDispatcher::disabled());
    let side_effects = SideEffectDispatcher::new(db.clone(), inventory_dyn, webhooks);
    let existence_sync = ExistenceSyncService::new(db.clone());
    let (event_sender, event_rx): (EventSender, _) = event_channel(64);

    let purchase_orders = PurchaseOrderService::new(
        db.clone(),
        existence_sync,
        side_effects.clone(),
        event_sender.clone(),
    );
    let receipts = ReceiptService::new(db.clone(), side_effects, event_sender);

    TestApp {
        db,
        purchase_orders,
        receipts,
        inventory,
        _event_rx: event_rx,
    }
}

pub async fn seed_location(db: &DatabaseConnection, id: i64) {
    let now = Utc::now();
    locations::ActiveModel {
        id: Set(id),
        name: Set(format!("Location {}", id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed location");
}

pub async fn seed_staff_member(db: &DatabaseConnection, id: i64) {
    let now = Utc::now();
    staff_members::ActiveModel {
        id: Set(id),
        name: Set(format!("Staff {}", id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed staff member");
}

pub async fn seed_variant(db: &DatabaseConnection, id: i64, inventory_item_id: i64) {
    let now = Utc::now();
    product_variants::ActiveModel {
        id: Set(id),
        product_id: Set(id * 10),
        inventory_item_id: Set(inventory_item_id),
        sku: Set(Some(format!("SKU-{}", id))),
        title: Set(format!("Variant {}", id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed product variant");
}

/// Seeds a special order with one line item and returns the line item uuid.
pub async fn seed_special_order(
    db: &DatabaseConnection,
    name: &str,
    location_id: i64,
    product_variant_id: i64,
    quantity: i32,
) -> Uuid {
    let now = Utc::now();
    let order = special_orders::ActiveModel {
        name: Set(name.to_string()),
        location_id: Set(location_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed special order");

    let uuid = Uuid::new_v4();
    special_order_line_items::ActiveModel {
        special_order_id: Set(order.id),
        uuid: Set(uuid),
        product_variant_id: Set(product_variant_id),
        quantity: Set(quantity),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed special order line item");
    uuid
}
