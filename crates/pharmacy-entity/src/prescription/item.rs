//! Prescription line model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::product::Product;

/// One prescribed product with its delivery progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrescriptionItem {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub product_id: Uuid,
    pub quantity_prescribed: i32,
    pub quantity_delivered: i32,
    pub dosage_instructions: Option<String>,
}

impl PrescriptionItem {
    pub fn remaining_quantity(&self) -> i32 {
        (self.quantity_prescribed - self.quantity_delivered).max(0)
    }

    pub fn is_fully_delivered(&self) -> bool {
        self.quantity_delivered >= self.quantity_prescribed
    }

    /// Display label for the line; the product may have been deleted since.
    pub fn product_label(&self, product: Option<&Product>) -> String {
        match product {
            Some(product) => product.name.clone(),
            None => format!("Product unavailable (ID: {})", self.product_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPrescriptionItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity_prescribed: i32,
    pub dosage_instructions: Option<String>,
}

/// Quantity handed over for one prescription line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct ItemDelivery {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}
