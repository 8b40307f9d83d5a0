//! Batch alert checks over the whole catalog, and cleanup of old
//! read notifications.
//!
//! This is the safety net for conditions the observers cannot see, such as
//! an expiry date drawing closer with no write to the product. Its dedup
//! windows are longer than the observers' so a run every half hour does not
//! repeat itself.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use pharmacy_core::config::AlertingConfig;
use pharmacy_core::result::AppResult;
use pharmacy_database::store::{NotificationStore, PrescriptionStore, ProductStore, PurchaseStore};

use super::report::{AlertState, AlertSummary, PhaseReport, ReconciliationReport};
use crate::alerting::product::{expired_alert, expiring_alert, low_stock_alert, out_of_stock_alert};
use crate::alerting::prescription::expiring_alert as prescription_expiring_alert;
use crate::alerting::purchase::overdue_alert;
use crate::alerting::{AlertEmitter, AlertOutcome, Dedup};

#[derive(Debug, Clone)]
pub struct ReconciliationService {
    products: Arc<dyn ProductStore>,
    prescriptions: Arc<dyn PrescriptionStore>,
    purchases: Arc<dyn PurchaseStore>,
    notifications: Arc<dyn NotificationStore>,
    emitter: Arc<AlertEmitter>,
    settings: Arc<AlertingConfig>,
}

impl ReconciliationService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        prescriptions: Arc<dyn PrescriptionStore>,
        purchases: Arc<dyn PurchaseStore>,
        notifications: Arc<dyn NotificationStore>,
        emitter: Arc<AlertEmitter>,
        settings: Arc<AlertingConfig>,
    ) -> Self {
        Self {
            products,
            prescriptions,
            purchases,
            notifications,
            emitter,
            settings,
        }
    }

    pub fn settings(&self) -> &AlertingConfig {
        &self.settings
    }

    /// Products with `0 < stock <= threshold`.
    pub async fn check_low_stock(&self) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let products = match self.products.list_low_stock().await {
            Ok(products) => products,
            Err(e) => {
                outcome.record_failure("batch_low_stock", &e);
                return outcome;
            }
        };

        let dedup = Dedup::Within(self.settings.windows.batch_stock());
        for product in &products {
            self.emitter
                .emit_recorded("batch_low_stock", low_stock_alert(product, None, dedup), &mut outcome)
                .await;
        }
        info!(
            products = products.len(),
            created = outcome.created,
            "Low stock check finished"
        );
        outcome
    }

    pub async fn check_out_of_stock(&self) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let products = match self.products.list_out_of_stock().await {
            Ok(products) => products,
            Err(e) => {
                outcome.record_failure("batch_out_of_stock", &e);
                return outcome;
            }
        };

        let dedup = Dedup::Within(self.settings.windows.batch_stock());
        for product in &products {
            self.emitter
                .emit_recorded(
                    "batch_out_of_stock",
                    out_of_stock_alert(product, None, dedup),
                    &mut outcome,
                )
                .await;
        }
        info!(
            products = products.len(),
            created = outcome.created,
            "Out of stock check finished"
        );
        outcome
    }

    /// In-stock products expiring within `days`. Any expiry alert about the
    /// product in the batch window suppresses a new one.
    pub async fn check_expiring(&self, days: i64) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let today = Utc::now().date_naive();
        let products = match self
            .products
            .list_expiring_between(today, today + Duration::days(days))
            .await
        {
            Ok(products) => products,
            Err(e) => {
                outcome.record_failure("batch_expiring", &e);
                return outcome;
            }
        };

        let dedup = Dedup::SubjectWithin(self.settings.windows.batch_expiring());
        for product in &products {
            let (Some(expiry_date), Some(left)) =
                (product.expiry_date, product.days_until_expiry(today))
            else {
                continue;
            };
            self.emitter
                .emit_recorded(
                    "batch_expiring",
                    expiring_alert(product, expiry_date, left, dedup),
                    &mut outcome,
                )
                .await;
        }
        info!(
            days,
            products = products.len(),
            created = outcome.created,
            "Expiring products check finished"
        );
        outcome
    }

    /// Expired products still holding stock.
    pub async fn check_expired(&self) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let today = Utc::now().date_naive();
        let products = match self.products.list_expired_in_stock(today).await {
            Ok(products) => products,
            Err(e) => {
                outcome.record_failure("batch_expired", &e);
                return outcome;
            }
        };

        let dedup = Dedup::Within(self.settings.windows.batch_expired());
        for product in &products {
            let Some(expiry_date) = product.expiry_date else {
                continue;
            };
            self.emitter
                .emit_recorded(
                    "batch_expired",
                    expired_alert(product, expiry_date, today, dedup),
                    &mut outcome,
                )
                .await;
        }
        info!(
            products = products.len(),
            created = outcome.created,
            "Expired products check finished"
        );
        outcome
    }

    /// Pending orders past their expected date.
    pub async fn check_overdue_purchases(&self) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let today = Utc::now().date_naive();
        let purchases = match self.purchases.list_overdue(today).await {
            Ok(purchases) => purchases,
            Err(e) => {
                outcome.record_failure("batch_purchase_overdue", &e);
                return outcome;
            }
        };

        let dedup = Dedup::Within(self.settings.windows.purchase_overdue());
        for purchase in &purchases {
            if let Some(alert) = overdue_alert(purchase, today, dedup) {
                self.emitter
                    .emit_recorded("batch_purchase_overdue", alert, &mut outcome)
                    .await;
            }
        }
        info!(
            purchases = purchases.len(),
            created = outcome.created,
            "Overdue purchases check finished"
        );
        outcome
    }

    /// Pending prescriptions expiring within `prescription_expiry_days`.
    ///
    /// No write touches a prescription as its expiry approaches, so this
    /// scan is what raises the alert for most of them.
    pub async fn check_expiring_prescriptions(&self) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let today = Utc::now().date_naive();
        let lookahead = self.settings.prescription_expiry_days;
        let prescriptions = match self
            .prescriptions
            .list_expiring_pending(today, today + Duration::days(lookahead))
            .await
        {
            Ok(prescriptions) => prescriptions,
            Err(e) => {
                outcome.record_failure("batch_prescription_expiring", &e);
                return outcome;
            }
        };

        let dedup = Dedup::Within(self.settings.windows.prescription_expiring());
        for details in &prescriptions {
            if let Some(alert) = prescription_expiring_alert(details, today, lookahead, dedup) {
                self.emitter
                    .emit_recorded("batch_prescription_expiring", alert, &mut outcome)
                    .await;
            }
        }
        info!(
            prescriptions = prescriptions.len(),
            created = outcome.created,
            "Expiring prescriptions check finished"
        );
        outcome
    }

    /// Every check in order: low stock, out of stock, expiring within the
    /// lookahead, expiring within the urgent window, expired, overdue orders,
    /// expiring prescriptions. A failing phase is counted and the next one
    /// still runs.
    pub async fn run_all_checks(&self) -> ReconciliationReport {
        let started_at = Utc::now();
        let lookahead = self.settings.expiry_lookahead_days;
        let urgent = self.settings.expiry_urgent_days;

        let phases = vec![
            PhaseReport {
                phase: "low_stock".to_string(),
                outcome: self.check_low_stock().await,
            },
            PhaseReport {
                phase: "out_of_stock".to_string(),
                outcome: self.check_out_of_stock().await,
            },
            PhaseReport {
                phase: format!("expiring_{lookahead}d"),
                outcome: self.check_expiring(lookahead).await,
            },
            PhaseReport {
                phase: format!("expiring_{urgent}d"),
                outcome: self.check_expiring(urgent).await,
            },
            PhaseReport {
                phase: "expired".to_string(),
                outcome: self.check_expired().await,
            },
            PhaseReport {
                phase: "overdue_purchases".to_string(),
                outcome: self.check_overdue_purchases().await,
            },
            PhaseReport {
                phase: "expiring_prescriptions".to_string(),
                outcome: self.check_expiring_prescriptions().await,
            },
        ];

        let report = ReconciliationReport {
            started_at,
            finished_at: Utc::now(),
            phases,
        };
        let total = report.total();
        info!(
            created = total.created,
            suppressed = total.suppressed,
            failed = total.failed,
            duration_ms = report.duration_ms(),
            "All notification checks completed"
        );
        report
    }

    /// Delete notifications read more than `retention_days` ago. Unread
    /// ones are kept whatever their age.
    pub async fn cleanup(&self, retention_days: i64) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        let deleted = self.notifications.delete_read_before(cutoff).await?;
        info!(retention_days, deleted, "Old read notifications cleaned up");
        Ok(deleted)
    }

    /// Cleanup with the configured retention.
    pub async fn cleanup_default(&self) -> AppResult<u64> {
        self.cleanup(self.settings.retention_days).await
    }

    pub async fn summary(&self, since: DateTime<Utc>) -> AppResult<AlertSummary> {
        let counts = self.notifications.count_since(since).await?;
        Ok(AlertSummary { since, counts })
    }

    /// Current catalog counts per alert condition.
    pub async fn alert_state(&self) -> AppResult<AlertState> {
        let today = Utc::now().date_naive();
        let lookahead = Duration::days(self.settings.expiry_lookahead_days);
        Ok(AlertState {
            low_stock: self.products.list_low_stock().await?.len(),
            out_of_stock: self.products.list_out_of_stock().await?.len(),
            expiring: self
                .products
                .list_expiring_between(today, today + lookahead)
                .await?
                .len(),
            expired: self.products.list_expired_in_stock(today).await?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use pharmacy_database::memory::MemoryStore;
    use pharmacy_database::store::UserDirectory;
    use pharmacy_entity::product::NewProduct;
    use pharmacy_entity::user::{NewUser, UserRole};

    use crate::alerting::{LinkBuilder, RecipientResolver};

    async fn setup() -> (MemoryStore, ReconciliationService) {
        let store = MemoryStore::new();
        UserDirectory::create(
            &store,
            NewUser::new("Awa", "awa@officine.test", UserRole::Admin),
        )
        .await
        .unwrap();
        let shared = Arc::new(store.clone());
        let emitter = Arc::new(AlertEmitter::new(
            shared.clone(),
            RecipientResolver::new(shared.clone()),
            LinkBuilder::default(),
        ));
        let service = ReconciliationService::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            emitter,
            Arc::new(AlertingConfig::default()),
        );
        (store, service)
    }

    async fn product(store: &MemoryStore, stock: i32, threshold: i32) {
        ProductStore::create(
            store,
            NewProduct {
                name: format!("Produit {stock}/{threshold}"),
                stock_quantity: stock,
                stock_threshold: threshold,
                selling_price: Decimal::ONE,
                expiry_date: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_out_of_stock_does_not_raise_low_stock() {
        let (store, service) = setup().await;
        product(&store, 0, 5).await;

        assert_eq!(service.check_low_stock().await.created, 0);
        assert_eq!(service.check_out_of_stock().await.created, 1);
        assert_eq!(store.notifications()[0].alert_key, "out_of_stock");
    }

    #[tokio::test]
    async fn test_failed_phase_does_not_stop_the_run() {
        let (store, service) = setup().await;
        product(&store, 1, 5).await;
        product(&store, 0, 5).await;
        store.fail_notification_writes(true);

        let report = service.run_all_checks().await;
        assert_eq!(report.phases.len(), 7);
        assert_eq!(report.phase("low_stock").unwrap().outcome.failed, 1);
        assert_eq!(report.phase("out_of_stock").unwrap().outcome.failed, 1);
        assert_eq!(report.total().created, 0);
    }

    #[tokio::test]
    async fn test_alert_state_counts() {
        let (store, service) = setup().await;
        product(&store, 1, 5).await;
        product(&store, 0, 5).await;
        product(&store, 9, 5).await;
        let state = service.alert_state().await.unwrap();
        assert_eq!(state.low_stock, 1);
        assert_eq!(state.out_of_stock, 1);
        assert_eq!(state.expiring, 0);
    }
}
