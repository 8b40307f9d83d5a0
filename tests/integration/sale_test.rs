//! Sale alerts: significant sales and stock depleted by a sale.

use rust_decimal::Decimal;

use pharmacy_entity::notification::{AlertCause, AlertPayload, NotificationType};
use pharmacy_entity::sale::{NewSale, NewSaleItem, PaymentStatus};

use crate::helpers::TestApp;

fn sale_of(product_id: uuid::Uuid, quantity: i32) -> NewSale {
    NewSale {
        client_name: None,
        payment_status: PaymentStatus::Paid,
        items: vec![NewSaleItem {
            product_id,
            quantity,
            unit_price: None,
        }],
    }
}

#[tokio::test]
async fn test_significant_sale_notifies_admins() {
    let app = TestApp::new().await;
    let product = app.seed_product("Augmentin", 100, 5, None).await;

    let details = app
        .services
        .sales
        .record_sale(sale_of(product.id, 3), &app.pharmacist_actor())
        .await
        .unwrap();
    assert_eq!(details.sale.total_amount, Decimal::from(75));

    let alerts: Vec<_> = app
        .notifications_for(app.admin.id)
        .into_iter()
        .filter(|n| n.kind == NotificationType::SaleCreated)
        .collect();
    assert_eq!(alerts.len(), 1);
    match &alerts[0].data.0 {
        AlertPayload::SaleCreated {
            amount,
            seller,
            client,
            ..
        } => {
            assert_eq!(*amount, Decimal::from(75));
            assert_eq!(seller, "Ousmane Ba");
            assert_eq!(client, "Anonymous client");
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(app.notifications_for(app.pharmacist.id).is_empty());
}

#[tokio::test]
async fn test_small_sale_is_silent() {
    let app = TestApp::new().await;
    let product = app.seed_product("Strepsils", 100, 5, None).await;

    app.services
        .sales
        .record_sale(sale_of(product.id, 1), &app.pharmacist_actor())
        .await
        .unwrap();

    assert!(app.store.notifications().is_empty());
}

#[tokio::test]
async fn test_sale_depleting_stock_alerts_once() {
    let app = TestApp::new().await;
    let product = app.seed_product("Gaviscon", 6, 5, None).await;

    app.services
        .sales
        .record_sale(sale_of(product.id, 2), &app.pharmacist_actor())
        .await
        .unwrap();

    let alerts = app.with_key("low_stock", Some(product.id));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Critical stock after sale");
    match &alerts[0].data.0 {
        AlertPayload::LowStock {
            current_stock,
            caused_by,
            ..
        } => {
            assert_eq!(*current_stock, 4);
            assert_eq!(*caused_by, Some(AlertCause::Sale));
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_sale() {
    let app = TestApp::new().await;
    let product = app.seed_product("Maalox", 6, 5, None).await;
    app.store.fail_notification_writes(true);

    let details = app
        .services
        .sales
        .record_sale(sale_of(product.id, 4), &app.pharmacist_actor())
        .await
        .unwrap();

    assert_eq!(details.sale.total_amount, Decimal::from(100));
    assert_eq!(app.product(product.id).await.stock_quantity, 2);
    assert!(app.store.notifications().is_empty());
}

#[tokio::test]
async fn test_sale_beyond_stock_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Dafalgan", 2, 1, None).await;

    let err = app
        .services
        .sales
        .record_sale(sale_of(product.id, 3), &app.pharmacist_actor())
        .await
        .unwrap_err();

    assert_eq!(err.kind, pharmacy_core::error::ErrorKind::Validation);
    assert_eq!(app.product(product.id).await.stock_quantity, 2);
    assert!(app.store.notifications().is_empty());
}

#[tokio::test]
async fn test_sale_becoming_paid_is_flagged_when_creation_alert_was_lost() {
    let app = TestApp::new().await;
    let product = app.seed_product("Augmentin", 100, 5, None).await;

    app.store.fail_notification_writes(true);
    let details = app
        .services
        .sales
        .record_sale(
            NewSale {
                payment_status: PaymentStatus::Pending,
                ..sale_of(product.id, 3)
            },
            &app.pharmacist_actor(),
        )
        .await
        .unwrap();
    app.store.fail_notification_writes(false);
    let id = details.sale.id;
    assert!(app.with_key("created", Some(id)).is_empty());

    let paid = app
        .services
        .sales
        .update_payment_status(id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.sale.payment_status, PaymentStatus::Paid);

    let created = app.with_key("created", Some(id));
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].user_id, app.admin.id);
    assert_eq!(created[0].kind, NotificationType::SaleCreated);

    // Paying again after a rollback to pending finds the alert already there.
    app.services
        .sales
        .update_payment_status(id, PaymentStatus::Pending)
        .await
        .unwrap();
    app.services
        .sales
        .update_payment_status(id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(app.with_key("created", Some(id)).len(), 1);
}
