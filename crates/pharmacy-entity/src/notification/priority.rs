//! Notification priority levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Priority of a notification. `Normal` is the default level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    Medium,
    High,
}

impl NotificationPriority {
    /// Numeric weight (higher = more urgent).
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Normal => 2,
            Self::Medium => 3,
            Self::High => 4,
        }
    }

    /// Escalation for a product expiring in `days`: a week or less is high,
    /// up to fifteen days medium, anything later normal.
    pub fn for_days_until_expiry(days: i64) -> Self {
        if days <= 7 {
            Self::High
        } else if days <= 15 {
            Self::Medium
        } else {
            Self::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl PartialOrd for NotificationPriority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NotificationPriority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationPriority {
    type Err = pharmacy_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(pharmacy_core::AppError::validation(format!(
                "Invalid priority: '{s}'. Expected one of: low, normal, medium, high"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_escalation() {
        assert_eq!(NotificationPriority::for_days_until_expiry(0), NotificationPriority::High);
        assert_eq!(NotificationPriority::for_days_until_expiry(7), NotificationPriority::High);
        assert_eq!(NotificationPriority::for_days_until_expiry(8), NotificationPriority::Medium);
        assert_eq!(NotificationPriority::for_days_until_expiry(15), NotificationPriority::Medium);
        assert_eq!(NotificationPriority::for_days_until_expiry(16), NotificationPriority::Normal);
        assert_eq!(NotificationPriority::for_days_until_expiry(30), NotificationPriority::Normal);
    }

    #[test]
    fn test_ordering_and_default() {
        assert_eq!(NotificationPriority::default(), NotificationPriority::Normal);
        assert!(NotificationPriority::Normal > NotificationPriority::Low);
        assert!(NotificationPriority::High > NotificationPriority::Medium);
    }
}
