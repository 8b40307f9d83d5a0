//! Purchase order model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::status::PurchaseStatus;

/// A purchase order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: Uuid,
    /// Human-facing reference, unique per order.
    pub purchase_number: String,
    pub supplier_name: String,
    pub status: PurchaseStatus,
    pub order_date: NaiveDate,
    /// Delivery date promised by the supplier; drives the overdue check.
    pub expected_date: Option<NaiveDate>,
    /// Set when the order is fully received.
    pub received_date: Option<NaiveDate>,
    /// Order value in the configured currency.
    pub total_amount: Decimal,
    /// Item count ordered.
    pub total_items: i32,
    /// Item count received so far, never above `total_items`.
    pub received_items: i32,
    /// User who placed the order.
    pub created_by: Uuid,
    /// User who recorded the full receipt.
    pub received_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Still pending after the expected delivery date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == PurchaseStatus::Pending
            && self.expected_date.is_some_and(|expected| expected < today)
    }

    /// Whole days past the expected date, zero when on time or undated.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        self.expected_date
            .map(|expected| today.signed_duration_since(expected).num_days().max(0))
            .unwrap_or(0)
    }

    /// Received over ordered items, as a percentage with one decimal.
    pub fn progress_percentage(&self) -> f64 {
        if self.total_items <= 0 {
            return 0.0;
        }
        (f64::from(self.received_items) / f64::from(self.total_items) * 1000.0).round() / 10.0
    }
}

/// Input for placing a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPurchase {
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: String,
    pub order_date: NaiveDate,
    /// Optional promised delivery date.
    pub expected_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    /// Items ordered, at least one.
    #[validate(range(min = 1))]
    pub total_items: i32,
}
