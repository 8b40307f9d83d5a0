//! Prescription lifecycle alerts through the wired services.

use chrono::{Duration, Utc};
use uuid::Uuid;

use pharmacy_core::error::ErrorKind;
use pharmacy_database::store::{PrescriptionDraft, PrescriptionStore};
use pharmacy_entity::notification::{AlertPayload, NotificationPriority};
use pharmacy_entity::prescription::{
    ItemDelivery, NewPrescription, NewPrescriptionItem, PrescriptionDetails, PrescriptionStatus,
};

use crate::helpers::TestApp;

async fn prescribe(app: &TestApp, product_id: Uuid, quantity: i32) -> PrescriptionDetails {
    prescribe_until(app, product_id, quantity, 30).await
}

async fn prescribe_until(
    app: &TestApp,
    product_id: Uuid,
    quantity: i32,
    valid_days: i64,
) -> PrescriptionDetails {
    let today = Utc::now().date_naive();
    app.services
        .prescriptions
        .create(
            NewPrescription {
                client_name: "Awa Ndiaye".to_string(),
                doctor_name: "Dr Fall".to_string(),
                prescription_date: today,
                expiry_date: today + Duration::days(valid_days),
                items: vec![NewPrescriptionItem {
                    product_id,
                    quantity_prescribed: quantity,
                    dosage_instructions: Some("1 tablet morning and evening".to_string()),
                }],
            },
            &app.pharmacist_actor(),
        )
        .await
        .expect("Failed to create prescription")
}

#[tokio::test]
async fn test_new_prescription_reaches_pharmacists_and_admins() {
    let app = TestApp::new().await;
    let product = app.seed_product("Augmentin 1g", 50, 5, None).await;
    let details = prescribe(&app, product.id, 2).await;

    let created = app.with_key("created", Some(details.prescription.id));
    assert_eq!(created.len(), 2);
    let to_pharmacist = created
        .iter()
        .find(|n| n.user_id == app.pharmacist.id)
        .expect("pharmacist notified");
    assert_eq!(to_pharmacist.priority, NotificationPriority::Medium);
    let to_admin = created
        .iter()
        .find(|n| n.user_id == app.admin.id)
        .expect("admin notified");
    assert_eq!(to_admin.priority, NotificationPriority::Low);
}

#[tokio::test]
async fn test_full_delivery_notifies_completion_once() {
    let app = TestApp::new().await;
    let product = app.seed_product("Augmentin 1g", 50, 5, None).await;
    let details = prescribe(&app, product.id, 2).await;
    let id = details.prescription.id;

    let done = app
        .services
        .prescriptions
        .deliver(
            id,
            vec![ItemDelivery {
                item_id: details.items[0].id,
                quantity: 2,
            }],
            &app.pharmacist_actor(),
        )
        .await
        .unwrap();
    assert_eq!(done.prescription.status, PrescriptionStatus::Completed);
    assert_eq!(app.product(product.id).await.stock_quantity, 48);

    let completed = app.with_key("completed", Some(id));
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].user_id, app.admin.id);
    match &completed[0].data.0 {
        AlertPayload::PrescriptionCompleted { delivered_by, .. } => {
            assert_eq!(delivered_by, "Ousmane Ba")
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let before = app.store.notifications().len();
    app.services.prescriptions.refresh_status(id).await.unwrap();
    app.services.prescriptions.refresh_status(id).await.unwrap();
    assert_eq!(app.store.notifications().len(), before);
}

#[tokio::test]
async fn test_partial_delivery_notifies_pharmacists() {
    let app = TestApp::new().await;
    let product = app.seed_product("Doliprane 1000", 50, 5, None).await;
    let details = prescribe(&app, product.id, 2).await;

    let partial = app
        .services
        .prescriptions
        .deliver(
            details.prescription.id,
            vec![ItemDelivery {
                item_id: details.items[0].id,
                quantity: 1,
            }],
            &app.pharmacist_actor(),
        )
        .await
        .unwrap();
    assert_eq!(partial.prescription.status, PrescriptionStatus::PartiallyDelivered);

    let alerts = app.with_key("partially_delivered", Some(details.prescription.id));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].user_id, app.pharmacist.id);
    assert_eq!(alerts[0].priority, NotificationPriority::Medium);
    assert!(app.with_key("completed", Some(details.prescription.id)).is_empty());
}

#[tokio::test]
async fn test_delivery_beyond_stock_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Ventoline", 1, 0, None).await;
    let details = prescribe(&app, product.id, 3).await;

    let err = app
        .services
        .prescriptions
        .deliver(
            details.prescription.id,
            vec![ItemDelivery {
                item_id: details.items[0].id,
                quantity: 3,
            }],
            &app.pharmacist_actor(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.product(product.id).await.stock_quantity, 1);

    let current = app.services.prescriptions.find(details.prescription.id).await.unwrap();
    assert_eq!(current.prescription.status, PrescriptionStatus::Pending);
}

#[tokio::test]
async fn test_prescription_close_to_expiry_alerts_everyone_once() {
    let app = TestApp::new().await;
    let product = app.seed_product("Clamoxyl 500", 50, 5, None).await;
    let details = prescribe_until(&app, product.id, 4, 3).await;
    let id = details.prescription.id;

    let expiring = app.with_key("prescription_expiring", Some(id));
    assert_eq!(expiring.len(), 2);
    assert!(expiring.iter().all(|n| n.priority == NotificationPriority::High));
    match &expiring[0].data.0 {
        AlertPayload::PrescriptionExpiring {
            days_until_expiry, ..
        } => assert_eq!(*days_until_expiry, 3),
        other => panic!("unexpected payload {other:?}"),
    }

    let scan = app.services.reconciliation.check_expiring_prescriptions().await;
    assert_eq!(scan.created, 0);
    assert_eq!(scan.suppressed, 1);
    assert_eq!(app.with_key("prescription_expiring", Some(id)).len(), 2);
}

#[tokio::test]
async fn test_batch_scan_flags_pending_prescriptions_nearing_expiry() {
    let app = TestApp::new().await;
    let product = app.seed_product("Augmentin 1g", 50, 5, None).await;
    let today = Utc::now().date_naive();

    // Written straight to the store, as if registered weeks ago.
    let draft = |expiry_in: i64| PrescriptionDraft {
        prescription_number: format!("ORD-TEST-{expiry_in}"),
        client_name: "Moussa Sarr".to_string(),
        doctor_name: "Dr Fall".to_string(),
        prescription_date: today - Duration::days(20),
        expiry_date: today + Duration::days(expiry_in),
        created_by: app.pharmacist.id,
        items: vec![(product.id, 2, None)],
    };
    let due = PrescriptionStore::create(&app.store, draft(5)).await.unwrap();
    let later = PrescriptionStore::create(&app.store, draft(12)).await.unwrap();
    let started = PrescriptionStore::create(&app.store, draft(2)).await.unwrap();
    app.services
        .prescriptions
        .deliver(
            started.prescription.id,
            vec![ItemDelivery {
                item_id: started.items[0].id,
                quantity: 1,
            }],
            &app.pharmacist_actor(),
        )
        .await
        .unwrap();

    let scan = app.services.reconciliation.check_expiring_prescriptions().await;
    assert_eq!(scan.created, 2);
    assert_eq!(app.with_key("prescription_expiring", Some(due.prescription.id)).len(), 2);
    assert!(app.with_key("prescription_expiring", Some(later.prescription.id)).is_empty());
    assert!(app.with_key("prescription_expiring", Some(started.prescription.id)).is_empty());

    let again = app.services.reconciliation.check_expiring_prescriptions().await;
    assert_eq!((again.created, again.suppressed), (0, 1));
}
