//! Typed alert payloads stored in the notification `data` column.
//!
//! Each variant carries the subject id plus the display names needed to
//! render the alert without a join. The serialized form is tagged with an
//! `alert_type` field.
//!
//! Sale, prescription and purchase payloads carry no separate `action`
//! field: the lifecycle step is the variant itself. [`AlertPayload::action`]
//! exposes it, and it matches the notification's `alert_key`:
//!
//! | `alert_type`                       | action                |
//! |------------------------------------|-----------------------|
//! | `sale_created`                     | `created`             |
//! | `prescription_created`             | `created`             |
//! | `prescription_completed`           | `completed`           |
//! | `prescription_partially_delivered` | `partially_delivered` |
//! | `purchase_created`                 | `created`             |
//! | `purchase_received`                | `received`            |
//! | `purchase_partially_received`      | `partially_received`  |
//! | `purchase_cancelled`               | `cancelled`           |
//! | `purchase_overdue`                 | `overdue`             |
//!
//! Stock, expiry, replenishment and system payloads report a condition, not
//! a lifecycle step, and have no action.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::NotificationType;
use super::subject::AlertSubject;

/// What depleted the stock, when it was not a direct inventory edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCause {
    Sale,
}

/// Structured data of an alert, one variant per alert kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alert_type", rename_all = "snake_case")]
pub enum AlertPayload {
    LowStock {
        product_id: Uuid,
        product_name: String,
        current_stock: i32,
        threshold: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caused_by: Option<AlertCause>,
    },
    OutOfStock {
        product_id: Uuid,
        product_name: String,
        current_stock: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caused_by: Option<AlertCause>,
    },
    ExpiringSoon {
        product_id: Uuid,
        product_name: String,
        expiry_date: NaiveDate,
        days_until_expiry: i64,
        current_stock: i32,
    },
    Expired {
        product_id: Uuid,
        product_name: String,
        expiry_date: NaiveDate,
        days_expired: i64,
        current_stock: i32,
    },
    SaleCreated {
        sale_id: Uuid,
        sale_number: String,
        #[serde(with = "rust_decimal::serde::float")]
        amount: Decimal,
        seller: String,
        client: String,
    },
    PrescriptionCreated {
        prescription_id: Uuid,
        prescription_number: String,
        client_name: String,
        doctor_name: String,
    },
    PrescriptionCompleted {
        prescription_id: Uuid,
        prescription_number: String,
        client_name: String,
        delivered_by: String,
    },
    PrescriptionPartiallyDelivered {
        prescription_id: Uuid,
        prescription_number: String,
        client_name: String,
        /// Percentage of prescribed units delivered so far.
        progress: f64,
    },
    PrescriptionExpiring {
        prescription_id: Uuid,
        prescription_number: String,
        client_name: String,
        expiry_date: NaiveDate,
        days_until_expiry: i64,
    },
    PurchaseCreated {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
        #[serde(with = "rust_decimal::serde::float")]
        total_amount: Decimal,
        expected_date: Option<NaiveDate>,
    },
    PurchaseReceived {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
        #[serde(with = "rust_decimal::serde::float")]
        total_amount: Decimal,
        received_by: String,
    },
    StockReplenished {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
    },
    PurchasePartiallyReceived {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
        progress: f64,
        received_items: i32,
        total_items: i32,
    },
    PurchaseCancelled {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
        #[serde(with = "rust_decimal::serde::float")]
        total_amount: Decimal,
    },
    PurchaseOverdue {
        purchase_id: Uuid,
        purchase_number: String,
        supplier_name: String,
        expected_date: NaiveDate,
        days_overdue: i64,
    },
    SystemMessage {
        created_by_system: bool,
    },
    Custom {
        #[serde(default)]
        details: serde_json::Value,
    },
}

impl AlertPayload {
    /// The entity this alert is about.
    pub fn subject(&self) -> AlertSubject {
        match self {
            Self::LowStock { product_id, .. }
            | Self::OutOfStock { product_id, .. }
            | Self::ExpiringSoon { product_id, .. }
            | Self::Expired { product_id, .. } => AlertSubject::Product(*product_id),
            Self::SaleCreated { sale_id, .. } => AlertSubject::Sale(*sale_id),
            Self::PrescriptionCreated { prescription_id, .. }
            | Self::PrescriptionCompleted { prescription_id, .. }
            | Self::PrescriptionPartiallyDelivered { prescription_id, .. }
            | Self::PrescriptionExpiring { prescription_id, .. } => {
                AlertSubject::Prescription(*prescription_id)
            }
            Self::PurchaseCreated { purchase_id, .. }
            | Self::PurchaseReceived { purchase_id, .. }
            | Self::StockReplenished { purchase_id, .. }
            | Self::PurchasePartiallyReceived { purchase_id, .. }
            | Self::PurchaseCancelled { purchase_id, .. }
            | Self::PurchaseOverdue { purchase_id, .. } => AlertSubject::Purchase(*purchase_id),
            Self::SystemMessage { .. } | Self::Custom { .. } => AlertSubject::System,
        }
    }

    /// Deduplication key stored next to the subject: the alert type for
    /// stock and expiry alerts, the lifecycle action otherwise.
    pub fn alert_key(&self) -> &'static str {
        match self {
            Self::LowStock { .. } => "low_stock",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::ExpiringSoon { .. } => "expiring_soon",
            Self::Expired { .. } => "expired",
            Self::SaleCreated { .. } => "created",
            Self::PrescriptionCreated { .. } => "created",
            Self::PrescriptionCompleted { .. } => "completed",
            Self::PrescriptionPartiallyDelivered { .. } => "partially_delivered",
            Self::PrescriptionExpiring { .. } => "prescription_expiring",
            Self::PurchaseCreated { .. } => "created",
            Self::PurchaseReceived { .. } => "received",
            Self::StockReplenished { .. } => "stock_replenished",
            Self::PurchasePartiallyReceived { .. } => "partially_received",
            Self::PurchaseCancelled { .. } => "cancelled",
            Self::PurchaseOverdue { .. } => "overdue",
            Self::SystemMessage { .. } => "system_message",
            Self::Custom { .. } => "custom",
        }
    }

    /// Lifecycle step of a sale, prescription or purchase alert.
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Self::SaleCreated { .. }
            | Self::PrescriptionCreated { .. }
            | Self::PrescriptionCompleted { .. }
            | Self::PrescriptionPartiallyDelivered { .. }
            | Self::PurchaseCreated { .. }
            | Self::PurchaseReceived { .. }
            | Self::PurchasePartiallyReceived { .. }
            | Self::PurchaseCancelled { .. }
            | Self::PurchaseOverdue { .. } => Some(self.alert_key()),
            Self::LowStock { .. }
            | Self::OutOfStock { .. }
            | Self::ExpiringSoon { .. }
            | Self::Expired { .. }
            | Self::PrescriptionExpiring { .. }
            | Self::StockReplenished { .. }
            | Self::SystemMessage { .. }
            | Self::Custom { .. } => None,
        }
    }

    /// Notification type this payload is filed under.
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::LowStock { .. } | Self::OutOfStock { .. } => NotificationType::StockAlert,
            Self::ExpiringSoon { .. } | Self::Expired { .. } | Self::PrescriptionExpiring { .. } => {
                NotificationType::ExpiryAlert
            }
            Self::SaleCreated { .. } => NotificationType::SaleCreated,
            Self::PrescriptionCreated { .. }
            | Self::PrescriptionCompleted { .. }
            | Self::PrescriptionPartiallyDelivered { .. } => NotificationType::PrescriptionReady,
            Self::PurchaseCreated { .. }
            | Self::PurchaseReceived { .. }
            | Self::PurchasePartiallyReceived { .. } => NotificationType::PurchaseReceived,
            Self::StockReplenished { .. }
            | Self::PurchaseCancelled { .. }
            | Self::PurchaseOverdue { .. }
            | Self::SystemMessage { .. }
            | Self::Custom { .. } => NotificationType::SystemAlert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_serializes_flat_with_alert_type() {
        let id = Uuid::new_v4();
        let payload = AlertPayload::LowStock {
            product_id: id,
            product_name: "Amoxicilline 1g".to_string(),
            current_stock: 1,
            threshold: 5,
            caused_by: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["alert_type"], "low_stock");
        assert_eq!(json["current_stock"], 1);
        assert_eq!(json["threshold"], 5);
        assert_eq!(json["product_id"], id.to_string());
        assert!(json.get("caused_by").is_none());
    }

    #[test]
    fn test_sale_amount_serializes_as_number() {
        let payload = AlertPayload::SaleCreated {
            sale_id: Uuid::new_v4(),
            sale_number: "V-0001".to_string(),
            amount: Decimal::from(75),
            seller: "Kofi".to_string(),
            client: "Anonymous client".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["amount"], 75.0);
        let back: AlertPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_keys_and_types() {
        let purchase_id = Uuid::new_v4();
        let replenished = AlertPayload::StockReplenished {
            purchase_id,
            purchase_number: "ACH-1".to_string(),
            supplier_name: "Ubipharm".to_string(),
        };
        assert_eq!(replenished.notification_type(), NotificationType::SystemAlert);
        assert_eq!(replenished.alert_key(), "stock_replenished");
        assert_eq!(replenished.subject(), AlertSubject::Purchase(purchase_id));

        let system = AlertPayload::SystemMessage {
            created_by_system: true,
        };
        assert_eq!(system.subject(), AlertSubject::System);
        assert_eq!(system.subject().detail_path(), None);
    }

    #[test]
    fn test_action_follows_lifecycle_variant() {
        let purchase_id = Uuid::new_v4();
        let cancelled = AlertPayload::PurchaseCancelled {
            purchase_id,
            purchase_number: "ACH-2".to_string(),
            supplier_name: "Laborex".to_string(),
            total_amount: Decimal::from(300),
        };
        assert_eq!(cancelled.action(), Some("cancelled"));
        let json = serde_json::to_value(&cancelled).unwrap();
        assert_eq!(json["alert_type"], "purchase_cancelled");

        let overdue = AlertPayload::PurchaseOverdue {
            purchase_id,
            purchase_number: "ACH-2".to_string(),
            supplier_name: "Laborex".to_string(),
            expected_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            days_overdue: 4,
        };
        assert_eq!(overdue.action(), Some(overdue.alert_key()));

        let sale = AlertPayload::SaleCreated {
            sale_id: Uuid::new_v4(),
            sale_number: "V-0002".to_string(),
            amount: Decimal::from(80),
            seller: "Kofi".to_string(),
            client: "Fatou".to_string(),
        };
        assert_eq!(sale.action(), Some("created"));

        let replenished = AlertPayload::StockReplenished {
            purchase_id,
            purchase_number: "ACH-2".to_string(),
            supplier_name: "Laborex".to_string(),
        };
        assert_eq!(replenished.action(), None);
    }
}
