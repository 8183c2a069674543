//! Integration tests for delivery projection and materialization.
//!
//! Tests cover:
//! - No delivery view before an order ships
//! - The virtual projection of a shipped order
//! - Materialization with preparing defaults, idempotently
//! - Edits that materialize the projection on first touch
//! - Delivery and order statuses running independently afterwards
//! - The delivery listing merging real records and projections
//! - Delivery events

mod common;

use common::TestApp;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use gescom_core::{
    events::Event,
    models::{
        delivery::{CarrierInfo, DeliveryPatch, DeliveryStatus, DeliveryView},
        order::OrderStatus,
    },
    EngineError,
};

// ==================== Projection Tests ====================

#[tokio::test]
async fn orders_have_no_delivery_view_before_shipping() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8001").await;

    let err = app
        .services
        .deliveries
        .get_for_order(order_id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::NotFound(_));

    app.drive_to(order_id, OrderStatus::Confirmed).await;
    let err = app
        .services
        .deliveries
        .get_for_order(order_id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::NotFound(_));
}

#[tokio::test]
async fn shipped_orders_get_a_virtual_delivery() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8002").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;
    let order = app.services.orders.get_order(order_id).await.unwrap();

    let view = app
        .services
        .deliveries
        .get_for_order(order_id)
        .await
        .unwrap();

    let projection = match view {
        DeliveryView::Virtual(projection) => projection,
        DeliveryView::Real(_) => panic!("expected a projection, not a record"),
    };
    assert_eq!(projection.number, "LIV-CMD-2024-8002");
    assert_eq!(projection.order_id, order_id);
    assert_eq!(projection.status, DeliveryStatus::Shipped);
    assert_eq!(projection.shipped_at, order.shipped_at);
}

// ==================== Materialization Tests ====================

#[tokio::test]
async fn materializing_creates_a_preparing_record_once() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8003").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;

    let delivery = app.services.deliveries.materialize(order_id).await.unwrap();
    assert_eq!(delivery.number, "LIV-CMD-2024-8003");
    assert_eq!(delivery.status, DeliveryStatus::Preparing);
    assert!(delivery.carrier.is_none());
    assert_eq!(delivery.fees, dec!(0));

    // Second call returns the same record instead of inserting another.
    let again = app.services.deliveries.materialize(order_id).await.unwrap();
    assert_eq!(again.id, delivery.id);

    let view = app
        .services
        .deliveries
        .get_for_order(order_id)
        .await
        .unwrap();
    assert_matches!(view, DeliveryView::Real(d) if d.id == delivery.id);
}

#[tokio::test]
async fn materializing_an_unshipped_order_is_rejected() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8004").await;
    app.drive_to(order_id, OrderStatus::Confirmed).await;

    let err = app
        .services
        .deliveries
        .materialize(order_id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::InvalidOperation(_));
}

#[tokio::test]
async fn first_edit_materializes_and_applies_the_patch() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8005").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;

    let delivery = app
        .services
        .deliveries
        .update_for_order(
            order_id,
            DeliveryPatch {
                carrier: Some(CarrierInfo {
                    name: "Rapide Poste".to_string(),
                    mode: Some("route".to_string()),
                    tracking_number: Some("RP-778812".to_string()),
                }),
                fees: Some(dec!(12.500)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(delivery.status, DeliveryStatus::Preparing);
    assert_eq!(delivery.carrier.as_ref().map(|c| c.name.as_str()), Some("Rapide Poste"));
    assert_eq!(delivery.fees, dec!(12.500));
    assert!(delivery.updated_at.is_some());
}

#[tokio::test]
async fn negative_fees_are_rejected() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8006").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;

    let err = app
        .services
        .deliveries
        .update_for_order(
            order_id,
            DeliveryPatch {
                fees: Some(dec!(-1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::ValidationError(_));
}

// ==================== Status Independence Tests ====================

#[tokio::test]
async fn delivery_status_runs_its_own_machine_after_materialization() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8007").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;

    let delivery = app.services.deliveries.materialize(order_id).await.unwrap();
    // The record starts over in preparing even though the order already
    // shipped; the projection status is not carried across.
    assert_eq!(delivery.status, DeliveryStatus::Preparing);

    let delivery = app
        .services
        .deliveries
        .mark_shipped(delivery.id)
        .await
        .unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Shipped);
    assert!(delivery.shipped_at.is_some());

    let delivery = app
        .services
        .deliveries
        .update_delivery(
            delivery.id,
            DeliveryPatch {
                status: Some(DeliveryStatus::InTransit),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let delivery = app
        .services
        .deliveries
        .mark_delivered(delivery.id)
        .await
        .unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Delivered);
    assert!(delivery.delivered_at.is_some());

    // The order never moved.
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn delivery_shortcuts_are_rejected() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8008").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;
    let delivery = app.services.deliveries.materialize(order_id).await.unwrap();

    // Preparing cannot jump straight to delivered.
    let err = app
        .services
        .deliveries
        .mark_delivered(delivery.id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::InvalidStatusTransition(_));
}

#[tokio::test]
async fn delivering_the_order_stamps_but_does_not_move_the_delivery() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8009").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;
    let delivery = app.services.deliveries.materialize(order_id).await.unwrap();

    app.services
        .orders
        .update_status(order_id, OrderStatus::Delivered)
        .await
        .unwrap();

    let delivery = app
        .services
        .deliveries
        .get_delivery(delivery.id)
        .await
        .unwrap();
    // Reception date recorded, status left to the delivery's own machine.
    assert!(delivery.delivered_at.is_some());
    assert_eq!(delivery.status, DeliveryStatus::Preparing);
}

#[tokio::test]
async fn delivering_an_order_without_a_record_materializes_one() {
    let app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8010").await;
    app.drive_to(order_id, OrderStatus::Delivered).await;

    let view = app
        .services
        .deliveries
        .get_for_order(order_id)
        .await
        .unwrap();
    let delivery = match view {
        DeliveryView::Real(delivery) => delivery,
        DeliveryView::Virtual(_) => panic!("delivery should have been materialized"),
    };
    assert_eq!(delivery.number, "LIV-CMD-2024-8010");
    assert!(delivery.delivered_at.is_some());
    assert_eq!(delivery.status, DeliveryStatus::Preparing);
}

// ==================== Listing Tests ====================

#[tokio::test]
async fn listing_merges_records_and_projections() {
    let app = TestApp::new().await;

    let materialized_id = app.create_sale_order("CMD-2024-8011").await;
    app.drive_to(materialized_id, OrderStatus::Shipped).await;
    let delivery = app
        .services
        .deliveries
        .materialize(materialized_id)
        .await
        .unwrap();

    let projected_id = app.create_sale_order("CMD-2024-8012").await;
    app.drive_to(projected_id, OrderStatus::Shipped).await;

    let unshipped_id = app.create_sale_order("CMD-2024-8013").await;
    app.drive_to(unshipped_id, OrderStatus::Confirmed).await;

    let views = app.services.deliveries.list_deliveries().await.unwrap();
    assert_eq!(views.len(), 2);

    let real = views
        .iter()
        .find(|view| matches!(view, DeliveryView::Real(_)))
        .expect("materialized delivery missing from the listing");
    assert_eq!(real.order_id(), materialized_id);
    assert_eq!(real.status(), delivery.status);

    let projected = views
        .iter()
        .find(|view| matches!(view, DeliveryView::Virtual(_)))
        .expect("projection missing from the listing");
    assert_eq!(projected.order_id(), projected_id);
    assert_eq!(projected.status(), DeliveryStatus::Shipped);
}

// ==================== Delivery Event Tests ====================

#[tokio::test]
async fn materialization_and_status_changes_publish_events() {
    let mut app = TestApp::new().await;
    let order_id = app.create_sale_order("CMD-2024-8014").await;
    app.drive_to(order_id, OrderStatus::Shipped).await;

    let delivery = app.services.deliveries.materialize(order_id).await.unwrap();
    app.services
        .deliveries
        .mark_shipped(delivery.id)
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = app.event_receiver.try_recv() {
        events.push(event);
    }

    assert!(events.iter().any(|event| matches!(
        event,
        Event::DeliveryMaterialized { delivery_id, order_id: oid }
            if *delivery_id == delivery.id && *oid == order_id
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::DeliveryStatusChanged {
            delivery_id,
            old_status: DeliveryStatus::Preparing,
            new_status: DeliveryStatus::Shipped,
        } if *delivery_id == delivery.id
    )));
}
