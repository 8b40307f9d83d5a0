//! Stock and expiry alerts, from both the observer and the batch path.

use chrono::{Duration, Utc};

use pharmacy_entity::notification::{AlertPayload, NotificationPriority};
use pharmacy_entity::product::ProductUpdate;

use crate::helpers::{TestApp, new_product};

#[tokio::test]
async fn test_low_stock_batch_alert_is_not_repeated() {
    let app = TestApp::new().await;
    let product = app.seed_product("Amoxicilline 500mg", 1, 5, None).await;

    let first = app.services.reconciliation.check_low_stock().await;
    assert_eq!(first.created, 1);

    let alerts = app.with_key("low_stock", Some(product.id));
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.user_id, app.admin.id);
    assert_eq!(alert.priority, NotificationPriority::High);
    assert!(alert.title.contains("Critical stock"));
    match &alert.data.0 {
        AlertPayload::LowStock {
            current_stock,
            threshold,
            ..
        } => assert_eq!((*current_stock, *threshold), (1, 5)),
        other => panic!("unexpected payload {other:?}"),
    }

    let second = app.services.reconciliation.check_low_stock().await;
    assert_eq!(second.created, 0);
    assert_eq!(second.suppressed, 1);
    assert_eq!(app.with_key("low_stock", Some(product.id)).len(), 1);
}

#[tokio::test]
async fn test_out_of_stock_is_distinct_from_low_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("Smecta", 0, 5, None).await;

    assert_eq!(app.services.reconciliation.check_low_stock().await.created, 0);
    assert_eq!(app.services.reconciliation.check_out_of_stock().await.created, 1);

    assert!(app.with_key("low_stock", Some(product.id)).is_empty());
    assert_eq!(app.with_key("out_of_stock", Some(product.id)).len(), 1);
}

#[tokio::test]
async fn test_crossing_threshold_alerts_once() {
    let app = TestApp::new().await;
    let product = app
        .services
        .inventory
        .create_product(new_product("Ventoline", 10, 5, None))
        .await
        .unwrap();
    assert!(app.store.notifications().is_empty());

    app.services.inventory.adjust_stock(product.id, -6).await.unwrap();
    app.services.inventory.adjust_stock(product.id, -1).await.unwrap();

    assert_eq!(app.with_key("low_stock", Some(product.id)).len(), 1);
    assert_eq!(app.product(product.id).await.stock_quantity, 3);
}

#[tokio::test]
async fn test_restocking_marks_stock_alerts_read() {
    let app = TestApp::new().await;
    let product = app
        .services
        .inventory
        .create_product(new_product("Spasfon", 1, 5, None))
        .await
        .unwrap();
    assert_eq!(app.services.notifications.unread_count(app.admin.id).await.unwrap(), 1);

    app.services
        .inventory
        .update_product(product.id, ProductUpdate::stock(20))
        .await
        .unwrap();

    let alerts = app.with_key("low_stock", Some(product.id));
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].read_at.is_some());
    assert_eq!(app.services.notifications.unread_count(app.admin.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_expiry_priority_tiers() {
    let app = TestApp::new().await;
    let today = Utc::now().date_naive();
    let in_days = |days: i64| Some(today + Duration::days(days));

    let week = app.seed_product("Insuline", 10, 2, in_days(7)).await;
    let ten = app.seed_product("Collyre", 10, 2, in_days(10)).await;
    let twenty = app.seed_product("Sirop", 10, 2, in_days(20)).await;
    let later = app.seed_product("Pommade", 10, 2, in_days(31)).await;

    let outcome = app.services.reconciliation.check_expiring(30).await;
    // Expiry alerts go to every user.
    assert_eq!(outcome.created, 6);

    let priority_of = |id| {
        let alerts = app.with_key("expiring_soon", Some(id));
        assert_eq!(alerts.len(), 2);
        alerts[0].priority
    };
    assert_eq!(priority_of(week.id), NotificationPriority::High);
    assert_eq!(priority_of(ten.id), NotificationPriority::Medium);
    assert_eq!(priority_of(twenty.id), NotificationPriority::Normal);
    assert!(app.with_key("expiring_soon", Some(later.id)).is_empty());

    let urgent = app.services.reconciliation.check_expiring(7).await;
    assert_eq!(urgent.created, 0);
    assert_eq!(urgent.suppressed, 1);
}

#[tokio::test]
async fn test_expired_without_stock_is_ignored() {
    let app = TestApp::new().await;
    let yesterday = Some(Utc::now().date_naive() - Duration::days(1));
    let empty = app.seed_product("Doliprane", 0, 2, yesterday).await;
    let stocked = app.seed_product("Efferalgan", 3, 2, yesterday).await;

    app.services.reconciliation.check_expired().await;

    assert!(app.with_key("expired", Some(empty.id)).is_empty());
    let alerts = app.with_key("expired", Some(stocked.id));
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].priority, NotificationPriority::High);
}
