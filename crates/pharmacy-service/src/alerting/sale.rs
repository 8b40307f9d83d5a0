//! Significant-sale and post-sale stock alerts.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use pharmacy_core::config::AlertingConfig;
use pharmacy_database::store::ProductStore;
use pharmacy_entity::notification::{AlertCause, AlertPayload, AlertSubject, NotificationPriority};
use pharmacy_entity::sale::{PaymentStatus, SaleDetails};

use super::emitter::{Alert, AlertEmitter, Dedup, Delivery, Emission};
use super::outcome::AlertOutcome;
use super::product::stock_level_alert;
use super::recipients::Audience;

const ANONYMOUS_CLIENT: &str = "Anonymous client";

/// Informational alert for a sale at or above the significance threshold.
///
/// Raised at most once per sale.
pub fn significant_sale_alert(details: &SaleDetails, currency: &str) -> Alert {
    let sale = &details.sale;
    let client = sale
        .client_name
        .clone()
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string());
    let message = format!(
        "Sale {} of {} {} recorded by {} for {}",
        sale.sale_number, sale.total_amount, currency, details.seller_name, client
    );
    Alert::new(
        AlertPayload::SaleCreated {
            sale_id: sale.id,
            sale_number: sale.sale_number.clone(),
            amount: sale.total_amount,
            seller: details.seller_name.clone(),
            client,
        },
        Dedup::Permanent,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Low,
        "Significant sale recorded",
        message,
    ))
}

/// Observer reacting to recorded sales and payment updates.
#[derive(Debug, Clone)]
pub struct SaleAlerts {
    emitter: Arc<AlertEmitter>,
    products: Arc<dyn ProductStore>,
    settings: Arc<AlertingConfig>,
}

impl SaleAlerts {
    pub fn new(
        emitter: Arc<AlertEmitter>,
        products: Arc<dyn ProductStore>,
        settings: Arc<AlertingConfig>,
    ) -> Self {
        Self {
            emitter,
            products,
            settings,
        }
    }

    fn is_significant(&self, amount: Decimal) -> bool {
        amount >= Decimal::from(self.settings.significant_sale_amount)
    }

    pub async fn on_created(&self, details: &SaleDetails) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        info!(
            sale_id = %details.sale.id,
            sale_number = %details.sale.sale_number,
            total_amount = %details.sale.total_amount,
            "Sale recorded, checking alerts"
        );

        if self.is_significant(details.sale.total_amount) {
            self.emitter
                .emit_recorded(
                    "significant_sale",
                    significant_sale_alert(details, &self.settings.currency),
                    &mut outcome,
                )
                .await;
        }
        self.check_stock_after_sale(details, &mut outcome).await;
        outcome
    }

    /// A sale that becomes paid may qualify retroactively.
    pub async fn on_payment_updated(
        &self,
        previous: PaymentStatus,
        details: &SaleDetails,
    ) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let sale = &details.sale;
        if previous != sale.payment_status
            && sale.payment_status == PaymentStatus::Paid
            && self.is_significant(sale.total_amount)
        {
            self.emitter
                .emit_recorded(
                    "significant_sale",
                    significant_sale_alert(details, &self.settings.currency),
                    &mut outcome,
                )
                .await;
        }
        outcome
    }

    /// Re-read every sold product and flag depleted stock, tagged as caused by the sale.
    async fn check_stock_after_sale(&self, details: &SaleDetails, outcome: &mut AlertOutcome) {
        let dedup = Dedup::Within(self.settings.windows.sale_stock());
        let mut seen = Vec::with_capacity(details.items.len());

        for item in &details.items {
            if seen.contains(&item.product_id) {
                continue;
            }
            seen.push(item.product_id);
            let subject = AlertSubject::Product(item.product_id);

            let product = match self.products.find_by_id(item.product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    warn!(
                        sale_id = %details.sale.id,
                        product_id = %item.product_id,
                        "Sold product no longer exists, skipping stock check"
                    );
                    continue;
                }
                Err(e) => {
                    outcome.record("sale_stock_level", subject, Err(e));
                    continue;
                }
            };

            info!(
                product_id = %product.id,
                current_stock = product.stock_quantity,
                threshold = product.stock_threshold,
                quantity_sold = item.quantity,
                "Checking stock after sale"
            );
            match stock_level_alert(&product, Some(AlertCause::Sale), dedup) {
                Some(alert) => {
                    self.emitter
                        .emit_recorded("sale_stock_level", alert, outcome)
                        .await
                }
                None => outcome.record("sale_stock_level", subject, Ok(Emission::Skipped)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use pharmacy_entity::sale::Sale;

    #[test]
    fn test_significant_sale_payload() {
        let details = SaleDetails {
            sale: Sale {
                id: Uuid::new_v4(),
                sale_number: "VTE-20260310-0A1B2C".to_string(),
                user_id: Uuid::new_v4(),
                client_name: None,
                total_amount: Decimal::from(75),
                payment_status: PaymentStatus::Paid,
                created_at: Utc::now(),
            },
            items: Vec::new(),
            seller_name: "Mariam".to_string(),
        };
        let alert = significant_sale_alert(&details, "EUR");
        assert_eq!(alert.dedup, Dedup::Permanent);
        assert_eq!(alert.deliveries[0].priority, NotificationPriority::Low);
        assert!(alert.deliveries[0].message.contains("75 EUR"));
        match alert.payload {
            AlertPayload::SaleCreated { amount, seller, client, .. } => {
                assert_eq!(amount, Decimal::from(75));
                assert_eq!(seller, "Mariam");
                assert_eq!(client, ANONYMOUS_CLIENT);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
