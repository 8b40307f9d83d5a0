//! Product entity model and stock/expiry predicates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub stock_quantity: i32,
    /// Stock at or below this level counts as low.
    pub stock_threshold: i32,
    pub selling_price: Decimal,
    /// Products without an expiry date are exempt from expiry checks.
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Coarse stock state derived from quantity and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Sufficient,
    /// At or below the threshold but still on the shelf.
    Low,
    /// Nothing left.
    Out,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        if self.stock_quantity <= 0 {
            StockLevel::Out
        } else if self.stock_quantity <= self.stock_threshold {
            StockLevel::Low
        } else {
            StockLevel::Sufficient
        }
    }

    pub fn is_at_or_below_threshold(&self) -> bool {
        self.stock_quantity <= self.stock_threshold
    }

    /// Whole calendar days from `today` to the expiry date; negative once past.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date
            .map(|expiry| expiry.signed_duration_since(today).num_days())
    }

    /// Expired means the expiry date is strictly before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }

    /// Expired stock still on the shelf.
    pub fn has_expired_stock(&self, today: NaiveDate) -> bool {
        self.stock_quantity > 0 && self.is_expired(today)
    }

    /// Expiring within `days` (inclusive), not yet expired.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        self.days_until_expiry(today)
            .is_some_and(|left| (0..=days).contains(&left))
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    #[validate(range(min = 0))]
    pub stock_threshold: i32,
    pub selling_price: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

/// Partial update of a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub stock_quantity: Option<i32>,
    pub stock_threshold: Option<i32>,
    pub selling_price: Option<Decimal>,
    /// `Some(None)` clears the expiry date.
    pub expiry_date: Option<Option<NaiveDate>>,
}

impl ProductUpdate {
    pub fn stock(quantity: i32) -> Self {
        Self {
            stock_quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.stock_quantity.is_none()
            && self.stock_threshold.is_none()
            && self.selling_price.is_none()
            && self.expiry_date.is_none()
    }

    /// Apply the update to a copy of `product`.
    pub fn apply_to(&self, product: &Product) -> Product {
        let mut updated = product.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(quantity) = self.stock_quantity {
            updated.stock_quantity = quantity;
        }
        if let Some(threshold) = self.stock_threshold {
            updated.stock_threshold = threshold;
        }
        if let Some(price) = self.selling_price {
            updated.selling_price = price;
        }
        if let Some(expiry) = self.expiry_date {
            updated.expiry_date = expiry;
        }
        updated
    }
}
