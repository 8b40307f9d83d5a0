//! Purchase order alerts.
//!
//! Builders turn a [`Purchase`] into an [`Alert`] ready for the emitter;
//! [`PurchaseAlerts`] decides which of them a lifecycle event warrants.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use pharmacy_core::config::AlertingConfig;
use pharmacy_database::store::UserDirectory;
use pharmacy_entity::notification::{AlertPayload, AlertSubject, NotificationPriority};
use pharmacy_entity::purchase::{Purchase, PurchaseStatus};

use super::emitter::{Alert, AlertEmitter, Dedup, Delivery, Emission};
use super::outcome::AlertOutcome;
use super::recipients::Audience;

const UNKNOWN_USER: &str = "Unknown";

/// New order, for managers. Sent once per purchase.
pub fn created_alert(purchase: &Purchase, currency: &str) -> Alert {
    let expected = purchase
        .expected_date
        .map(|d| format!(", expected on {}", d.format("%d/%m/%Y")))
        .unwrap_or_default();
    Alert::new(
        AlertPayload::PurchaseCreated {
            purchase_id: purchase.id,
            purchase_number: purchase.purchase_number.clone(),
            supplier_name: purchase.supplier_name.clone(),
            total_amount: purchase.total_amount,
            expected_date: purchase.expected_date,
        },
        Dedup::Permanent,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Low,
        "New purchase order",
        format!(
            "Purchase {} placed with {} for {} {}{}",
            purchase.purchase_number, purchase.supplier_name, purchase.total_amount, currency, expected
        ),
    ))
}

/// Full receipt, for managers. `received_by` is the display name of the
/// user who recorded it. Sent once per purchase.
pub fn received_alert(purchase: &Purchase, received_by: &str) -> Alert {
    Alert::new(
        AlertPayload::PurchaseReceived {
            purchase_id: purchase.id,
            purchase_number: purchase.purchase_number.clone(),
            supplier_name: purchase.supplier_name.clone(),
            total_amount: purchase.total_amount,
            received_by: received_by.to_string(),
        },
        Dedup::Permanent,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Low,
        "Purchase received",
        format!(
            "Purchase {} from {} has been fully received",
            purchase.purchase_number, purchase.supplier_name
        ),
    ))
}

/// Broadcast sent alongside the first "received" alert of a purchase.
pub fn stock_replenished_alert(purchase: &Purchase) -> Alert {
    Alert::new(
        AlertPayload::StockReplenished {
            purchase_id: purchase.id,
            purchase_number: purchase.purchase_number.clone(),
            supplier_name: purchase.supplier_name.clone(),
        },
        Dedup::None,
    )
    .deliver(Delivery::new(
        Audience::AllUsers,
        NotificationPriority::Normal,
        "Stock replenished",
        format!(
            "Purchase {} has been received, stock is up to date",
            purchase.purchase_number
        ),
    ))
}

/// Partial receipt with the received share of items, for managers. Every
/// partial receipt is reported.
pub fn partially_received_alert(purchase: &Purchase) -> Alert {
    let progress = purchase.progress_percentage();
    Alert::new(
        AlertPayload::PurchasePartiallyReceived {
            purchase_id: purchase.id,
            purchase_number: purchase.purchase_number.clone(),
            supplier_name: purchase.supplier_name.clone(),
            progress,
            received_items: purchase.received_items,
            total_items: purchase.total_items,
        },
        Dedup::None,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Medium,
        "Purchase partially received",
        format!(
            "Purchase {} from {} is partially received ({progress}%)",
            purchase.purchase_number, purchase.supplier_name
        ),
    ))
}

/// Cancelled order, for managers.
pub fn cancelled_alert(purchase: &Purchase) -> Alert {
    Alert::new(
        AlertPayload::PurchaseCancelled {
            purchase_id: purchase.id,
            purchase_number: purchase.purchase_number.clone(),
            supplier_name: purchase.supplier_name.clone(),
            total_amount: purchase.total_amount,
        },
        Dedup::None,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Medium,
        "Purchase cancelled",
        format!(
            "Purchase {} from {} has been cancelled",
            purchase.purchase_number, purchase.supplier_name
        ),
    ))
}

/// Overdue alert for a pending order past its expected date.
pub fn overdue_alert(purchase: &Purchase, today: NaiveDate, dedup: Dedup) -> Option<Alert> {
    if !purchase.is_overdue(today) {
        return None;
    }
    let expected_date = purchase.expected_date?;
    let days_overdue = purchase.days_overdue(today);
    Some(
        Alert::new(
            AlertPayload::PurchaseOverdue {
                purchase_id: purchase.id,
                purchase_number: purchase.purchase_number.clone(),
                supplier_name: purchase.supplier_name.clone(),
                expected_date,
                days_overdue,
            },
            dedup,
        )
        .deliver(Delivery::new(
            Audience::Admins,
            NotificationPriority::High,
            "Purchase overdue",
            format!(
                "Purchase {} from {} is {days_overdue} day(s) late",
                purchase.purchase_number, purchase.supplier_name
            ),
        )),
    )
}

/// Observer reacting to purchase orders being placed and updated.
#[derive(Debug, Clone)]
pub struct PurchaseAlerts {
    emitter: Arc<AlertEmitter>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<AlertingConfig>,
}

impl PurchaseAlerts {
    /// `users` resolves the name shown on receipts.
    pub fn new(
        emitter: Arc<AlertEmitter>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<AlertingConfig>,
    ) -> Self {
        Self {
            emitter,
            users,
            settings,
        }
    }

    /// Overdue reminders repeat at most once per configured window.
    pub fn overdue_dedup(&self) -> Dedup {
        Dedup::Within(self.settings.windows.purchase_overdue())
    }

    /// Announce a newly placed order.
    pub async fn on_created(&self, purchase: &Purchase) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        info!(
            purchase_id = %purchase.id,
            purchase_number = %purchase.purchase_number,
            supplier = %purchase.supplier_name,
            "Purchase created, sending notifications"
        );
        self.emitter
            .emit_recorded(
                "purchase_created",
                created_alert(purchase, &self.settings.currency),
                &mut outcome,
            )
            .await;
        outcome
    }

    /// React to a status change from `previous`, then re-run the overdue
    /// check whatever the change.
    pub async fn on_updated(&self, previous: PurchaseStatus, purchase: &Purchase) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();

        if previous != purchase.status {
            match purchase.status {
                PurchaseStatus::Received => self.notify_received(purchase, &mut outcome).await,
                PurchaseStatus::PartiallyReceived => {
                    self.emitter
                        .emit_recorded(
                            "purchase_partially_received",
                            partially_received_alert(purchase),
                            &mut outcome,
                        )
                        .await
                }
                PurchaseStatus::Cancelled => {
                    self.emitter
                        .emit_recorded("purchase_cancelled", cancelled_alert(purchase), &mut outcome)
                        .await
                }
                PurchaseStatus::Pending => {}
            }
        }

        self.check_overdue(purchase, &mut outcome).await;
        outcome
    }

    /// Overdue check on its own, shared with the batch scan.
    pub async fn check_overdue(&self, purchase: &Purchase, outcome: &mut AlertOutcome) {
        if let Some(alert) = overdue_alert(purchase, Utc::now().date_naive(), self.overdue_dedup()) {
            self.emitter
                .emit_recorded("purchase_overdue", alert, outcome)
                .await;
        }
    }

    /// Managers get the receipt; everyone hears about the new stock, but
    /// only the first time the receipt is recorded.
    async fn notify_received(&self, purchase: &Purchase, outcome: &mut AlertOutcome) {
        let subject = AlertSubject::Purchase(purchase.id);
        let received_by = self.received_by_name(purchase).await;

        let result = self.emitter.emit(received_alert(purchase, &received_by)).await;
        let first_receipt = matches!(result, Ok(Emission::Created(_)));
        outcome.record("purchase_received", subject, result);

        if first_receipt {
            info!(
                purchase_id = %purchase.id,
                supplier = %purchase.supplier_name,
                "Purchase received, broadcasting stock replenishment"
            );
            self.emitter
                .emit_recorded("stock_replenished", stock_replenished_alert(purchase), outcome)
                .await;
        }
    }

    async fn received_by_name(&self, purchase: &Purchase) -> String {
        let Some(user_id) = purchase.received_by else {
            return UNKNOWN_USER.to_string();
        };
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user.name,
            _ => UNKNOWN_USER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn purchase(status: PurchaseStatus, expected_date: Option<NaiveDate>) -> Purchase {
        let order_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        Purchase {
            id: Uuid::new_v4(),
            purchase_number: "ACH-20260301-FF0011".to_string(),
            supplier_name: "Laborex".to_string(),
            status,
            order_date,
            expected_date,
            received_date: None,
            total_amount: Decimal::new(125_000, 2),
            total_items: 40,
            received_items: 10,
            created_by: Uuid::new_v4(),
            received_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_only_when_pending_and_late() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let late = purchase(PurchaseStatus::Pending, Some(today - Duration::days(4)));
        let alert = overdue_alert(&late, today, Dedup::None).unwrap();
        assert_eq!(alert.deliveries[0].priority, NotificationPriority::High);
        match alert.payload {
            AlertPayload::PurchaseOverdue { days_overdue, .. } => assert_eq!(days_overdue, 4),
            other => panic!("unexpected payload {other:?}"),
        }

        let due_today = purchase(PurchaseStatus::Pending, Some(today));
        assert!(overdue_alert(&due_today, today, Dedup::None).is_none());

        let cancelled = purchase(PurchaseStatus::Cancelled, Some(today - Duration::days(4)));
        assert!(overdue_alert(&cancelled, today, Dedup::None).is_none());

        let undated = purchase(PurchaseStatus::Pending, None);
        assert!(overdue_alert(&undated, today, Dedup::None).is_none());
    }

    #[test]
    fn test_partial_receipt_progress() {
        let alert = partially_received_alert(&purchase(PurchaseStatus::PartiallyReceived, None));
        match alert.payload {
            AlertPayload::PurchasePartiallyReceived { progress, received_items, total_items, .. } => {
                assert_eq!(progress, 25.0);
                assert_eq!((received_items, total_items), (10, 40));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_receipt_broadcast_reaches_everyone() {
        let alert = stock_replenished_alert(&purchase(PurchaseStatus::Received, None));
        assert_eq!(alert.deliveries[0].audience, Audience::AllUsers);
        assert_eq!(alert.deliveries[0].priority, NotificationPriority::Normal);
        assert_eq!(alert.payload.alert_key(), "stock_replenished");
    }
}
