mod common;

use common::{seed_location, seed_staff_member, seed_variant, spawn_app};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::inventory_sync::InventoryCounter;
use stockroom_api::services::purchase_orders::dto::{
    LineItemInput, PurchaseOrderStatus, PurchaseOrderType, ReceiptLineItemInput, ReceiptStatus,
    UpsertPurchaseOrderInput, UpsertReceiptInput,
};
use stockroom_api::services::Identity;
use uuid::Uuid;

fn line(uuid: Uuid, variant: i64, quantity: i32) -> LineItemInput {
    LineItemInput {
        uuid,
        product_variant_id: variant,
        quantity,
        unit_cost: dec!(4.50),
        special_order_line_item: None,
        serial_number: None,
        custom_fields: BTreeMap::new(),
    }
}

fn po_input(name: Option<&str>, location: i64, line_items: Vec<LineItemInput>) -> UpsertPurchaseOrderInput {
    UpsertPurchaseOrderInput {
        name: name.map(str::to_string),
        status: PurchaseOrderStatus::Ordered,
        po_type: PurchaseOrderType::Normal,
        vendor_name: Some("Acme Supply".into()),
        location_id: Some(location),
        note: None,
        ship_from: None,
        ship_to: None,
        discount: None,
        tax: None,
        shipping: None,
        deposited: None,
        paid: None,
        employee_assignments: Vec::new(),
        custom_fields: BTreeMap::new(),
        line_items,
    }
}

#[tokio::test]
async fn create_allocates_sequential_name_and_pushes_incoming() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;

    let identity = Identity::unrestricted(1);
    let result = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 100, 10)]))
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.name, "PO-#1");
    assert_eq!(app.inventory.quantity(InventoryCounter::Incoming, 1, 1000), 10);
    assert_eq!(app.inventory.quantity(InventoryCounter::Available, 1, 1000), 0);

    let second = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 100, 1)]))
        .await
        .unwrap();
    assert_eq!(second.name, "PO-#2");
}

#[tokio::test]
async fn identical_resave_produces_no_further_adjustments() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let uuid = Uuid::new_v4();
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(uuid, 100, 10)]))
        .await
        .unwrap();
    let batches_after_create = app.inventory.recorded_batches().len();

    let resaved = app
        .purchase_orders
        .upsert_purchase_order(
            &identity,
            po_input(Some(&created.name), 1, vec![line(uuid, 100, 10)]),
        )
        .await
        .unwrap();
    assert!(!resaved.created);
    assert_eq!(app.inventory.recorded_batches().len(), batches_after_create);
    assert_eq!(app.inventory.quantity(InventoryCounter::Incoming, 1, 1000), 10);
}

#[tokio::test]
async fn quantity_edit_pushes_only_the_difference() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let uuid = Uuid::new_v4();
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(uuid, 100, 10)]))
        .await
        .unwrap();
    app.purchase_orders
        .upsert_purchase_order(
            &identity,
            po_input(Some(&created.name), 1, vec![line(uuid, 100, 7)]),
        )
        .await
        .unwrap();
    assert_eq!(app.inventory.quantity(InventoryCounter::Incoming, 1, 1000), 7);
}

#[tokio::test]
async fn dropship_orders_never_count_as_incoming() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let mut input = po_input(None, 1, vec![line(Uuid::new_v4(), 100, 25)]);
    input.po_type = PurchaseOrderType::Dropship;
    app.purchase_orders
        .upsert_purchase_order(&identity, input)
        .await
        .unwrap();
    assert_eq!(app.inventory.quantity(InventoryCounter::Incoming, 1, 1000), 0);
    assert!(app.inventory.recorded_batches().is_empty());
}

#[tokio::test]
async fn unknown_product_variant_is_rejected() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    let identity = Identity::unrestricted(1);

    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 999, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
    assert!(err.to_string().contains("unknown product variants"));
}

#[tokio::test]
async fn unknown_staff_assignment_is_rejected() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    seed_staff_member(&app.db, 5).await;
    let identity = Identity::unrestricted(1);

    let mut input = po_input(None, 1, vec![line(Uuid::new_v4(), 100, 1)]);
    input.employee_assignments = vec![5, 6];
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, input)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown staff members"));
}

#[tokio::test]
async fn restricted_identity_cannot_touch_other_locations() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;

    let identity = Identity {
        staff_member_id: 1,
        allowed_location_ids: vec![2],
    };
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 100, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn received_lines_cannot_be_reduced_or_removed() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let uuid = Uuid::new_v4();
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(uuid, 100, 10)]))
        .await
        .unwrap();
    app.receipts
        .upsert_receipt(
            &identity,
            UpsertReceiptInput {
                purchase_order_name: created.name.clone(),
                name: None,
                status: ReceiptStatus::Completed,
                description: None,
                received_at: None,
                line_items: vec![ReceiptLineItemInput {
                    line_item_uuid: uuid,
                    quantity: 4,
                }],
            },
        )
        .await
        .unwrap();

    // Below the received floor.
    let err = app
        .purchase_orders
        .upsert_purchase_order(
            &identity,
            po_input(Some(&created.name), 1, vec![line(uuid, 100, 3)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Removal of a received line.
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(Some(&created.name), 1, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Down to exactly the floor is fine.
    app.purchase_orders
        .upsert_purchase_order(
            &identity,
            po_input(Some(&created.name), 1, vec![line(uuid, 100, 4)]),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn upstream_rejection_surfaces_after_the_save_stands() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    app.inventory.fail_adjustments(true);
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 100, 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(_)));

    // The purchase order itself was committed before the push failed.
    let saved = app.purchase_orders.get_purchase_order("PO-#1").await.unwrap();
    assert_eq!(saved.line_items.len(), 1);
    assert_eq!(saved.line_items[0].quantity, 10);
}

#[tokio::test]
async fn unknown_name_on_update_is_not_found() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let err = app
        .purchase_orders
        .upsert_purchase_order(
            &identity,
            po_input(Some("PO-#404"), 1, vec![line(Uuid::new_v4(), 100, 1)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn custom_fields_and_assignments_are_fully_replaced() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    seed_staff_member(&app.db, 5).await;
    seed_staff_member(&app.db, 6).await;
    let identity = Identity::unrestricted(1);

    let uuid = Uuid::new_v4();
    let mut input = po_input(None, 1, vec![line(uuid, 100, 5)]);
    input.employee_assignments = vec![5];
    input.custom_fields.insert("po-number".into(), "A-17".into());
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, input)
        .await
        .unwrap();

    let mut update = po_input(Some(&created.name), 1, vec![line(uuid, 100, 5)]);
    update.employee_assignments = vec![6];
    update.custom_fields.insert("carrier".into(), "UPS".into());
    app.purchase_orders
        .upsert_purchase_order(&identity, update)
        .await
        .unwrap();

    let saved = app
        .purchase_orders
        .get_purchase_order(&created.name)
        .await
        .unwrap();
    assert_eq!(saved.employee_assignments, vec![6]);
    assert_eq!(saved.custom_fields.get("carrier").unwrap(), "UPS");
    assert!(!saved.custom_fields.contains_key("po-number"));
}

#[tokio::test]
async fn upsert_counters_appear_in_metrics_output() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, 1, vec![line(Uuid::new_v4(), 100, 1)]))
        .await
        .unwrap();

    let rendered = stockroom_api::metrics_text().unwrap();
    assert!(rendered.contains("purchase_order_upserts_total"));
}

#[tokio::test]
async fn average_unit_cost_is_pushed_for_touched_variants() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let mut input = po_input(None, 1, vec![line(Uuid::new_v4(), 100, 10)]);
    input.line_items[0].unit_cost = dec!(3);
    app.purchase_orders
        .upsert_purchase_order(&identity, input)
        .await
        .unwrap();
    assert_eq!(app.inventory.unit_cost(1000), Some(dec!(3)));

    // A second order at a different cost moves the weighted average.
    let mut input = po_input(None, 1, vec![line(Uuid::new_v4(), 100, 10)]);
    input.line_items[0].unit_cost = dec!(5);
    app.purchase_orders
        .upsert_purchase_order(&identity, input)
        .await
        .unwrap();
    assert_eq!(app.inventory.unit_cost(1000), Some(dec!(4)));
}
