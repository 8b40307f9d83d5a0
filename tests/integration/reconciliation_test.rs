//! Batch reconciliation, cleanup and reporting.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use pharmacy_entity::notification::{
    AlertPayload, NewNotification, NotificationPriority, NotificationType,
};
use pharmacy_entity::purchase::NewPurchase;

use crate::helpers::TestApp;

fn system_message(user_id: Uuid) -> NewNotification {
    NewNotification {
        user_id,
        kind: NotificationType::SystemAlert,
        title: "Inventory".to_string(),
        message: "Annual inventory on Saturday".to_string(),
        data: AlertPayload::SystemMessage {
            created_by_system: true,
        },
        priority: NotificationPriority::Normal,
        action_url: None,
        expires_at: None,
    }
}

#[tokio::test]
async fn test_cleanup_only_removes_old_read_notifications() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let mut old_read =
        system_message(app.admin.id).into_notification(Uuid::new_v4(), now - Duration::days(45));
    old_read.read_at = Some(now - Duration::days(31));
    let mut recent_read =
        system_message(app.admin.id).into_notification(Uuid::new_v4(), now - Duration::days(45));
    recent_read.read_at = Some(now - Duration::days(1));
    let old_unread =
        system_message(app.admin.id).into_notification(Uuid::new_v4(), now - Duration::days(120));
    for n in [old_read.clone(), recent_read, old_unread] {
        app.store.insert_notification(n);
    }

    let deleted = app.services.reconciliation.cleanup_default().await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(app.store.notifications().len(), 2);
    assert!(app.store.notifications().iter().all(|n| n.id != old_read.id));

    assert_eq!(app.services.reconciliation.cleanup(30).await.unwrap(), 0);
}

#[tokio::test]
async fn test_run_all_checks_reports_phases_in_order() {
    let app = TestApp::new().await;
    app.seed_product("Amoxicilline 500mg", 2, 5, None).await;
    app.seed_product("Smecta", 0, 5, None).await;
    app.seed_product(
        "Efferalgan",
        4,
        1,
        Some(Utc::now().date_naive() + Duration::days(3)),
    )
    .await;

    let report = app.services.reconciliation.run_all_checks().await;
    let phases: Vec<&str> = report.phases.iter().map(|p| p.phase.as_str()).collect();
    assert_eq!(
        phases,
        vec![
            "low_stock",
            "out_of_stock",
            "expiring_30d",
            "expiring_7d",
            "expired",
            "overdue_purchases",
            "expiring_prescriptions",
        ]
    );
    assert_eq!(report.phase("low_stock").map(|p| p.outcome.created), Some(1));
    assert_eq!(report.phase("out_of_stock").map(|p| p.outcome.created), Some(1));
    assert_eq!(report.phase("expiring_30d").map(|p| p.outcome.created), Some(1));
    // The urgent pass finds the product already alerted by the wider one.
    assert_eq!(report.phase("expiring_7d").map(|p| p.outcome.suppressed), Some(1));
    assert_eq!(report.total().failed, 0);

    let again = app.services.reconciliation.run_all_checks().await;
    assert_eq!(again.total().created, 0);
}

#[tokio::test]
async fn test_overdue_purchase_is_flagged_once() {
    let app = TestApp::new().await;
    let today = Utc::now().date_naive();
    let purchase = app
        .services
        .purchases
        .create(
            NewPurchase {
                supplier_name: "Ubipharm".to_string(),
                order_date: today - Duration::days(10),
                expected_date: Some(today - Duration::days(2)),
                total_amount: Decimal::from(600),
                total_items: 15,
            },
            &app.admin_actor(),
        )
        .await
        .unwrap();

    let first = app.services.reconciliation.check_overdue_purchases().await;
    assert_eq!(first.created, 1);
    let overdue = app.with_key("overdue", Some(purchase.id));
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].priority, NotificationPriority::High);
    match &overdue[0].data.0 {
        AlertPayload::PurchaseOverdue { days_overdue, .. } => assert_eq!(*days_overdue, 2),
        other => panic!("unexpected payload {other:?}"),
    }

    let second = app.services.reconciliation.check_overdue_purchases().await;
    assert_eq!(second.created, 0);
    assert_eq!(second.suppressed, 1);
}

#[tokio::test]
async fn test_summary_groups_by_type_and_priority() {
    let app = TestApp::new().await;
    app.seed_product("Amoxicilline 500mg", 1, 5, None).await;
    app.seed_product("Spasfon", 3, 5, None).await;
    app.services.reconciliation.check_low_stock().await;
    app.store
        .insert_notification(system_message(app.pharmacist.id).into_notification(Uuid::new_v4(), Utc::now()));

    let summary = app
        .services
        .reconciliation
        .summary(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(summary.total(), 3);

    let stock = summary
        .counts
        .iter()
        .find(|c| c.kind == NotificationType::StockAlert)
        .expect("stock alerts counted");
    assert_eq!(stock.count, 2);
    let system = summary
        .counts
        .iter()
        .find(|c| c.kind == NotificationType::SystemAlert)
        .expect("system alerts counted");
    assert_eq!((system.priority, system.count), (NotificationPriority::Normal, 1));

    let state = app.services.reconciliation.alert_state().await.unwrap();
    assert_eq!(state.low_stock, 2);
    assert_eq!(state.out_of_stock, 0);
}
