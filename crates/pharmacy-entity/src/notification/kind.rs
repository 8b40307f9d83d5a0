//! Notification type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad category of a notification, used for filtering and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    StockAlert,
    ExpiryAlert,
    SaleCreated,
    PrescriptionReady,
    PurchaseReceived,
    SystemAlert,
}

impl NotificationType {
    pub const ALL: [NotificationType; 6] = [
        Self::StockAlert,
        Self::ExpiryAlert,
        Self::SaleCreated,
        Self::PrescriptionReady,
        Self::PurchaseReceived,
        Self::SystemAlert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockAlert => "stock_alert",
            Self::ExpiryAlert => "expiry_alert",
            Self::SaleCreated => "sale_created",
            Self::PrescriptionReady => "prescription_ready",
            Self::PurchaseReceived => "purchase_received",
            Self::SystemAlert => "system_alert",
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StockAlert => "Stock alerts",
            Self::ExpiryAlert => "Expiry alerts",
            Self::SaleCreated => "Sales",
            Self::PrescriptionReady => "Prescriptions",
            Self::PurchaseReceived => "Purchases",
            Self::SystemAlert => "System alerts",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = pharmacy_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                pharmacy_core::AppError::validation(format!("Invalid notification type: '{s}'"))
            })
    }
}
