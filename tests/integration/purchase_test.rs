//! Purchase order alerts, including the replenishment broadcast.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use pharmacy_core::error::ErrorKind;
use pharmacy_entity::purchase::{NewPurchase, Purchase, PurchaseStatus};
use pharmacy_service::events::DomainEvent;

use crate::helpers::TestApp;

async fn order(app: &TestApp, total_items: i32) -> Purchase {
    let today = Utc::now().date_naive();
    app.services
        .purchases
        .create(
            NewPurchase {
                supplier_name: "Laborex".to_string(),
                order_date: today,
                expected_date: Some(today + Duration::days(5)),
                total_amount: Decimal::new(125_000, 2),
                total_items,
            },
            &app.admin_actor(),
        )
        .await
        .expect("Failed to create purchase")
}

#[tokio::test]
async fn test_receipt_broadcasts_replenishment_once() {
    let app = TestApp::new().await;
    let purchase = order(&app, 40).await;
    assert_eq!(app.with_key("created", Some(purchase.id)).len(), 1);

    let received = app
        .services
        .purchases
        .update_status(purchase.id, PurchaseStatus::Received, &app.admin_actor())
        .await
        .unwrap();
    assert_eq!(received.received_items, 40);

    let receipt = app.with_key("received", Some(purchase.id));
    assert_eq!(receipt.len(), 1);
    assert_eq!(receipt[0].user_id, app.admin.id);
    assert_eq!(app.with_key("stock_replenished", Some(purchase.id)).len(), 2);

    // Replaying the same transition finds the receipt already recorded.
    let before = app.store.notifications().len();
    app.services
        .events
        .publish(DomainEvent::PurchaseUpdated {
            previous_status: PurchaseStatus::Pending,
            purchase: received,
        })
        .await;
    assert_eq!(app.store.notifications().len(), before);
}

#[tokio::test]
async fn test_received_order_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let purchase = order(&app, 12).await;
    app.services
        .purchases
        .update_status(purchase.id, PurchaseStatus::Received, &app.admin_actor())
        .await
        .unwrap();

    let err = app
        .services
        .purchases
        .update_status(purchase.id, PurchaseStatus::Cancelled, &app.admin_actor())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(app.with_key("cancelled", Some(purchase.id)).is_empty());
}

#[tokio::test]
async fn test_partial_receipt_notifies_admins() {
    let app = TestApp::new().await;
    let purchase = order(&app, 40).await;

    let partial = app
        .services
        .purchases
        .record_receipt(purchase.id, 10, &app.admin_actor())
        .await
        .unwrap();
    assert_eq!(partial.status, PurchaseStatus::PartiallyReceived);

    let alerts = app.with_key("partially_received", Some(purchase.id));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].user_id, app.admin.id);
    assert!(alerts[0].message.contains("25%"));
    assert!(app.with_key("stock_replenished", Some(purchase.id)).is_empty());
}

#[tokio::test]
async fn test_cancellation_is_announced() {
    let app = TestApp::new().await;
    let purchase = order(&app, 8).await;
    app.services
        .purchases
        .update_status(purchase.id, PurchaseStatus::Cancelled, &app.admin_actor())
        .await
        .unwrap();
    assert_eq!(app.with_key("cancelled", Some(purchase.id)).len(), 1);
}
