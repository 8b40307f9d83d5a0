//! Stock and expiry alerts on products.
//!
//! The builders are shared by the per-event observer and the batch scan;
//! only the dedup windows differ between the two paths.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use pharmacy_core::config::AlertingConfig;
use pharmacy_entity::notification::{
    AlertCause, AlertPayload, AlertSubject, NotificationPriority, NotificationType,
};
use pharmacy_entity::product::{Product, StockLevel};

use super::emitter::{Alert, AlertEmitter, Dedup, Delivery};
use super::outcome::AlertOutcome;
use super::recipients::Audience;

pub fn low_stock_alert(product: &Product, caused_by: Option<AlertCause>, dedup: Dedup) -> Alert {
    let (title, message) = match caused_by {
        Some(AlertCause::Sale) => (
            "Critical stock after sale",
            format!(
                "Stock of {} is critical after a sale ({} units left, threshold: {})",
                product.name, product.stock_quantity, product.stock_threshold
            ),
        ),
        None => (
            "Critical stock alert",
            format!(
                "Product {} is at a critical stock level ({} units left, threshold: {})",
                product.name, product.stock_quantity, product.stock_threshold
            ),
        ),
    };
    Alert::new(
        AlertPayload::LowStock {
            product_id: product.id,
            product_name: product.name.clone(),
            current_stock: product.stock_quantity,
            threshold: product.stock_threshold,
            caused_by,
        },
        dedup,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::High,
        title,
        message,
    ))
}

pub fn out_of_stock_alert(product: &Product, caused_by: Option<AlertCause>, dedup: Dedup) -> Alert {
    let (title, message) = match caused_by {
        Some(AlertCause::Sale) => (
            "Out of stock after sale",
            format!("Product {} sold out after a sale", product.name),
        ),
        None => (
            "Product out of stock",
            format!("Product {} is out of stock (0 units available)", product.name),
        ),
    };
    Alert::new(
        AlertPayload::OutOfStock {
            product_id: product.id,
            product_name: product.name.clone(),
            current_stock: product.stock_quantity,
            caused_by,
        },
        dedup,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::High,
        title,
        message,
    ))
}

/// Out-of-stock or low-stock alert for the product's current level, never both.
pub fn stock_level_alert(
    product: &Product,
    caused_by: Option<AlertCause>,
    dedup: Dedup,
) -> Option<Alert> {
    match product.stock_level() {
        StockLevel::Out => Some(out_of_stock_alert(product, caused_by, dedup)),
        StockLevel::Low => Some(low_stock_alert(product, caused_by, dedup)),
        StockLevel::Sufficient => None,
    }
}

/// Expiring-soon alert; priority escalates as the date gets closer.
pub fn expiring_alert(product: &Product, expiry_date: NaiveDate, days: i64, dedup: Dedup) -> Alert {
    Alert::new(
        AlertPayload::ExpiringSoon {
            product_id: product.id,
            product_name: product.name.clone(),
            expiry_date,
            days_until_expiry: days,
            current_stock: product.stock_quantity,
        },
        dedup,
    )
    .deliver(Delivery::new(
        Audience::AllUsers,
        NotificationPriority::for_days_until_expiry(days),
        "Product expiring soon",
        format!(
            "Product {} expires in {} day(s) (expiry date: {})",
            product.name,
            days,
            expiry_date.format("%d/%m/%Y")
        ),
    ))
}

pub fn expired_alert(product: &Product, expiry_date: NaiveDate, today: NaiveDate, dedup: Dedup) -> Alert {
    let days_expired = today.signed_duration_since(expiry_date).num_days();
    Alert::new(
        AlertPayload::Expired {
            product_id: product.id,
            product_name: product.name.clone(),
            expiry_date,
            days_expired,
            current_stock: product.stock_quantity,
        },
        dedup,
    )
    .deliver(Delivery::new(
        Audience::AllUsers,
        NotificationPriority::High,
        "Product expired",
        format!(
            "Product {} expired {} day(s) ago (expiry date: {}) and {} unit(s) are still in stock",
            product.name,
            days_expired,
            expiry_date.format("%d/%m/%Y"),
            product.stock_quantity
        ),
    ))
}

/// Expired-with-stock or expiring-within-`lookahead_days` alert, if any.
///
/// Products without an expiry date or without stock never raise one.
pub fn expiry_alert(
    product: &Product,
    today: NaiveDate,
    lookahead_days: i64,
    expiring: Dedup,
    expired: Dedup,
) -> Option<Alert> {
    let expiry_date = product.expiry_date?;
    if product.stock_quantity <= 0 {
        return None;
    }
    if product.is_expired(today) {
        return Some(expired_alert(product, expiry_date, today, expired));
    }
    let days = product.days_until_expiry(today)?;
    product
        .expires_within(today, lookahead_days)
        .then(|| expiring_alert(product, expiry_date, days, expiring))
}

/// Observer reacting to product creation and updates.
#[derive(Debug, Clone)]
pub struct ProductAlerts {
    emitter: Arc<AlertEmitter>,
    settings: Arc<AlertingConfig>,
}

impl ProductAlerts {
    pub fn new(emitter: Arc<AlertEmitter>, settings: Arc<AlertingConfig>) -> Self {
        Self { emitter, settings }
    }

    fn stock_dedup(&self) -> Dedup {
        Dedup::Within(self.settings.windows.product_stock())
    }

    /// A new product is checked for stock level and expiry.
    pub async fn on_created(&self, product: &Product) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        if let Some(alert) = stock_level_alert(product, None, self.stock_dedup()) {
            self.emitter
                .emit_recorded("product_stock_level", alert, &mut outcome)
                .await;
        }
        self.check_expiry(product, &mut outcome).await;
        outcome
    }

    /// Only the fields that changed are re-evaluated.
    pub async fn on_updated(&self, before: &Product, after: &Product) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();

        if before.stock_quantity != after.stock_quantity {
            self.handle_stock_change(before.stock_quantity, after, &mut outcome)
                .await;
        }
        if before.expiry_date != after.expiry_date {
            self.check_expiry(after, &mut outcome).await;
        }
        if before.stock_threshold != after.stock_threshold {
            if let Some(alert) = stock_level_alert(after, None, self.stock_dedup()) {
                self.emitter
                    .emit_recorded("product_stock_level", alert, &mut outcome)
                    .await;
            }
        }
        outcome
    }

    async fn handle_stock_change(&self, old_stock: i32, product: &Product, outcome: &mut AlertOutcome) {
        let threshold = product.stock_threshold;
        let new_stock = product.stock_quantity;

        info!(
            product_id = %product.id,
            old_stock,
            new_stock,
            threshold,
            "Product stock changed"
        );

        if old_stock > threshold && new_stock <= threshold && new_stock > 0 {
            self.emitter
                .emit_recorded(
                    "product_low_stock",
                    low_stock_alert(product, None, self.stock_dedup()),
                    outcome,
                )
                .await;
        }
        if old_stock > 0 && new_stock <= 0 {
            self.emitter
                .emit_recorded(
                    "product_out_of_stock",
                    out_of_stock_alert(product, None, self.stock_dedup()),
                    outcome,
                )
                .await;
        }
        if old_stock <= threshold && new_stock > threshold {
            self.clear_stock_alerts(product, outcome).await;
        }
    }

    async fn check_expiry(&self, product: &Product, outcome: &mut AlertOutcome) {
        let today = Utc::now().date_naive();
        let windows = &self.settings.windows;
        if let Some(alert) = expiry_alert(
            product,
            today,
            self.settings.expiry_lookahead_days,
            Dedup::Within(windows.product_expiring()),
            Dedup::Within(windows.product_expired()),
        ) {
            self.emitter
                .emit_recorded("product_expiry", alert, outcome)
                .await;
        }
    }

    /// Restocked above threshold: unread stock alerts about it are stale.
    async fn clear_stock_alerts(&self, product: &Product, outcome: &mut AlertOutcome) {
        let subject = AlertSubject::Product(product.id);
        match self
            .emitter
            .store()
            .mark_subject_read(NotificationType::StockAlert, subject)
            .await
        {
            Ok(cleared) => info!(
                product_id = %product.id,
                cleared,
                "Cleared stale stock alerts"
            ),
            Err(e) => outcome.record("product_stock_restored", subject, Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn product(stock: i32, threshold: i32, expiry_date: Option<NaiveDate>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Amoxicilline 1g".to_string(),
            stock_quantity: stock,
            stock_threshold: threshold,
            selling_price: Decimal::new(1250, 2),
            expiry_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn priority(alert: &Alert) -> NotificationPriority {
        alert.deliveries[0].priority
    }

    #[test]
    fn test_stock_level_picks_one_alert() {
        let out = stock_level_alert(&product(0, 5, None), None, Dedup::None).unwrap();
        assert_eq!(out.payload.alert_key(), "out_of_stock");

        let low = stock_level_alert(&product(1, 5, None), None, Dedup::None).unwrap();
        assert_eq!(low.payload.alert_key(), "low_stock");
        assert!(low.deliveries[0].title.contains("Critical stock"));
        assert_eq!(low.deliveries[0].audience, Audience::Admins);

        assert!(stock_level_alert(&product(6, 5, None), None, Dedup::None).is_none());
    }

    #[test]
    fn test_sale_cause_is_tagged() {
        let alert = low_stock_alert(&product(2, 5, None), Some(AlertCause::Sale), Dedup::None);
        match alert.payload {
            AlertPayload::LowStock { caused_by, .. } => assert_eq!(caused_by, Some(AlertCause::Sale)),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_expiry_priority_escalation() {
        let at = |days: i64| product(10, 2, Some(today() + Duration::days(days)));
        let check = |p: &Product| expiry_alert(p, today(), 30, Dedup::None, Dedup::None);

        assert_eq!(priority(&check(&at(7)).unwrap()), NotificationPriority::High);
        assert_eq!(priority(&check(&at(10)).unwrap()), NotificationPriority::Medium);
        assert_eq!(priority(&check(&at(20)).unwrap()), NotificationPriority::Normal);
        assert!(check(&at(31)).is_none());

        let expiring_today = check(&at(0)).unwrap();
        assert_eq!(expiring_today.payload.alert_key(), "expiring_soon");
        assert_eq!(expiring_today.deliveries[0].audience, Audience::AllUsers);
    }

    #[test]
    fn test_expired_needs_stock_and_date() {
        let expired = product(4, 2, Some(today() - Duration::days(3)));
        let alert = expiry_alert(&expired, today(), 30, Dedup::None, Dedup::None).unwrap();
        match alert.payload {
            AlertPayload::Expired { days_expired, current_stock, .. } => {
                assert_eq!(days_expired, 3);
                assert_eq!(current_stock, 4);
            }
            other => panic!("unexpected payload {other:?}"),
        }

        let empty = product(0, 2, Some(today() - Duration::days(3)));
        assert!(expiry_alert(&empty, today(), 30, Dedup::None, Dedup::None).is_none());

        let undated = product(4, 2, None);
        assert!(expiry_alert(&undated, today(), 30, Dedup::None, Dedup::None).is_none());
    }
}
