//! Prescription lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a prescription.
///
/// `pending -> partially_delivered -> completed`, with `expired` reachable
/// from any state before completion once the expiry date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "prescription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Pending,
    PartiallyDelivered,
    Completed,
    Expired,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyDelivered => "partially_delivered",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// Whether items can still be delivered against the prescription.
    pub fn accepts_deliveries(&self) -> bool {
        matches!(self, Self::Pending | Self::PartiallyDelivered)
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = pharmacy_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "partially_delivered" => Ok(Self::PartiallyDelivered),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            _ => Err(pharmacy_core::AppError::validation(format!(
                "Invalid prescription status: '{s}'"
            ))),
        }
    }
}
