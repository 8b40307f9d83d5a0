//! Recording sales and updating their payment status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_database::store::{ProductStore, SaleDraft, SaleLine, SaleStore, UserDirectory};
use pharmacy_entity::product::Product;
use pharmacy_entity::sale::{NewSale, PaymentStatus, Sale, SaleDetails};

use crate::context::ActorContext;
use crate::events::{DomainEvent, EventBus};
use crate::numbering::{SALE_PREFIX, reference_number};

#[derive(Debug, Clone)]
pub struct SaleService {
    sales: Arc<dyn SaleStore>,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserDirectory>,
    events: EventBus,
}

impl SaleService {
    pub fn new(
        sales: Arc<dyn SaleStore>,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserDirectory>,
        events: EventBus,
    ) -> Self {
        Self {
            sales,
            products,
            users,
            events,
        }
    }

    /// Record a sale, decrementing stock for every line.
    ///
    /// The sale event is published before the per-product stock events, so
    /// depletion alerts carry the sale as their cause.
    pub async fn record_sale(&self, input: NewSale, actor: &ActorContext) -> AppResult<SaleDetails> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid sale: {e}")))?;

        let mut before: HashMap<Uuid, Product> = HashMap::new();
        let mut requested: HashMap<Uuid, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let product = match before.get(&item.product_id) {
                Some(product) => product.clone(),
                None => {
                    let product = self
                        .products
                        .find_by_id(item.product_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::not_found(format!("Product {} not found", item.product_id))
                        })?;
                    before.insert(product.id, product.clone());
                    product
                }
            };

            let unit_price = item.unit_price.unwrap_or(product.selling_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Unit price of {} cannot be negative",
                    product.name
                )));
            }

            let wanted = requested.entry(product.id).or_insert(0);
            *wanted += item.quantity;
            if *wanted > product.stock_quantity {
                return Err(AppError::validation(format!(
                    "Insufficient stock for {}: {} requested, {} available",
                    product.name, wanted, product.stock_quantity
                )));
            }

            lines.push(SaleLine {
                product_id: product.id,
                quantity: item.quantity,
                unit_price,
            });
        }

        let total_amount: Decimal = lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let recorded = self
            .sales
            .record_sale(SaleDraft {
                sale_number: reference_number(SALE_PREFIX, Utc::now().date_naive()),
                user_id: actor.user_id,
                client_name: input.client_name,
                payment_status: input.payment_status,
                total_amount,
                lines,
            })
            .await?;

        info!(
            sale_id = %recorded.sale.id,
            sale_number = %recorded.sale.sale_number,
            total_amount = %recorded.sale.total_amount,
            seller = %actor.name,
            "Sale recorded"
        );

        let details = SaleDetails {
            sale: recorded.sale,
            items: recorded.items,
            seller_name: actor.name.clone(),
        };

        self.events
            .publish(DomainEvent::SaleCreated(details.clone()))
            .await;
        for after in recorded.products {
            if let Some(previous) = before.remove(&after.id) {
                self.events
                    .publish(DomainEvent::ProductUpdated {
                        before: previous,
                        after,
                    })
                    .await;
            }
        }

        Ok(details)
    }

    pub async fn find_sale(&self, id: Uuid) -> AppResult<SaleDetails> {
        let sale = self
            .sales
            .find_sale(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale {id} not found")))?;
        self.details(sale).await
    }

    /// Change the payment status; unchanged status publishes nothing.
    pub async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> AppResult<SaleDetails> {
        let current = self
            .sales
            .find_sale(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale {id} not found")))?;
        if current.payment_status == status {
            return self.details(current).await;
        }

        let previous = current.payment_status;
        let updated = self.sales.update_payment_status(id, status).await?;
        info!(
            sale_id = %id,
            from = %previous,
            to = %status,
            "Sale payment status updated"
        );

        let details = self.details(updated).await?;
        self.events
            .publish(DomainEvent::SaleUpdated {
                previous_payment_status: previous,
                sale: details.clone(),
            })
            .await;
        Ok(details)
    }

    async fn details(&self, sale: Sale) -> AppResult<SaleDetails> {
        let items = self.sales.list_sale_items(sale.id).await?;
        let seller_name = self
            .users
            .find_by_id(sale.user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "Unknown".to_string());
        Ok(SaleDetails {
            sale,
            items,
            seller_name,
        })
    }
}
