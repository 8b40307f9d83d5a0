//! Sale and sale line models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::payment::PaymentStatus;

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub sale_number: String,
    /// The seller.
    pub user_id: Uuid,
    /// Walk-in customers have no client name.
    pub client_name: Option<String>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// One sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A sale together with its lines and display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub seller_name: String,
}

/// Input for recording a sale.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSale {
    #[validate(length(max = 255))]
    pub client_name: Option<String>,
    pub payment_status: PaymentStatus,
    #[validate(length(min = 1, message = "a sale needs at least one item"), nested)]
    pub items: Vec<NewSaleItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSaleItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the product's selling price.
    pub unit_price: Option<Decimal>,
}
