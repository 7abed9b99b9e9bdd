mod common;

use common::{seed_location, seed_special_order, seed_variant, spawn_app};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use stockroom_api::errors::ServiceError;
use stockroom_api::services::purchase_orders::dto::{
    LineItemInput, PurchaseOrderStatus, PurchaseOrderType, SpecialOrderLink,
    UpsertPurchaseOrderInput,
};
use stockroom_api::services::Identity;
use uuid::Uuid;

fn po_input(name: Option<&str>, line_items: Vec<LineItemInput>) -> UpsertPurchaseOrderInput {
    UpsertPurchaseOrderInput {
        name: name.map(str::to_string),
        status: PurchaseOrderStatus::Ordered,
        po_type: PurchaseOrderType::Normal,
        vendor_name: Some("Acme Supply".into()),
        location_id: Some(1),
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

fn line(variant: i64, quantity: i32) -> LineItemInput {
    LineItemInput {
        uuid: Uuid::new_v4(),
        product_variant_id: variant,
        quantity,
        unit_cost: dec!(9.99),
        special_order_line_item: None,
        serial_number: None,
        custom_fields: BTreeMap::new(),
    }
}

#[tokio::test]
async fn special_order_ceiling_spans_purchase_orders() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let so_uuid = seed_special_order(&app.db, "SO-#1", 1, 100, 5).await;
    let identity = Identity::unrestricted(1);
    let link = SpecialOrderLink {
        name: "SO-#1".into(),
        uuid: so_uuid,
    };

    let mut first = line(100, 3);
    first.special_order_line_item = Some(link.clone());
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![first]))
        .await
        .unwrap();

    // 3 committed elsewhere + 3 here exceeds the ceiling of 5.
    let mut second = line(100, 3);
    second.special_order_line_item = Some(link.clone());
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![second]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // 3 + 2 lands exactly on the ceiling.
    let mut third = line(100, 2);
    third.special_order_line_item = Some(link);
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![third]))
        .await
        .unwrap();
}

#[tokio::test]
async fn own_contribution_is_excluded_when_resaving() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let so_uuid = seed_special_order(&app.db, "SO-#1", 1, 100, 5).await;
    let identity = Identity::unrestricted(1);
    let link = SpecialOrderLink {
        name: "SO-#1".into(),
        uuid: so_uuid,
    };

    let mut li = line(100, 5);
    li.special_order_line_item = Some(link.clone());
    let uuid = li.uuid;
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![li]))
        .await
        .unwrap();

    // Resaving the same 5 must not read as 5 committed + 5 incoming.
    let mut li = line(100, 5);
    li.uuid = uuid;
    li.special_order_line_item = Some(link);
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(Some(&created.name), vec![li]))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_special_order_link_is_not_found() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let mut li = line(100, 1);
    li.special_order_line_item = Some(SpecialOrderLink {
        name: "SO-#404".into(),
        uuid: Uuid::new_v4(),
    });
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![li]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn serials_are_unique_across_purchase_orders() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let mut first = line(100, 1);
    first.serial_number = Some("SN-0001".into());
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![first]))
        .await
        .unwrap();

    let mut second = line(100, 1);
    second.serial_number = Some("SN-0001".into());
    let err = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![second]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
    assert!(err.to_string().contains("SN-0001"));
}

#[tokio::test]
async fn resaving_a_line_with_its_own_serial_is_allowed() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    let identity = Identity::unrestricted(1);

    let mut li = line(100, 1);
    li.serial_number = Some("SN-0002".into());
    let uuid = li.uuid;
    let created = app
        .purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![li]))
        .await
        .unwrap();

    let mut li = line(100, 1);
    li.uuid = uuid;
    li.serial_number = Some("SN-0002".into());
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(Some(&created.name), vec![li]))
        .await
        .unwrap();
}

#[tokio::test]
async fn same_serial_for_different_variants_does_not_conflict() {
    let app = spawn_app().await;
    seed_location(&app.db, 1).await;
    seed_variant(&app.db, 100, 1000).await;
    seed_variant(&app.db, 200, 2000).await;
    let identity = Identity::unrestricted(1);

    let mut first = line(100, 1);
    first.serial_number = Some("SN-0003".into());
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![first]))
        .await
        .unwrap();

    let mut second = line(200, 1);
    second.serial_number = Some("SN-0003".into());
    app.purchase_orders
        .upsert_purchase_order(&identity, po_input(None, vec![second]))
        .await
        .unwrap();
}
