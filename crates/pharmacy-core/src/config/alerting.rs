//! Alerting thresholds and deduplication windows.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Settings shared by the entity observers and the reconciliation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Prefix prepended to every notification deep link.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Currency label used in notification messages.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Sales at or above this amount notify the administrators.
    #[serde(default = "default_significant_sale_amount")]
    pub significant_sale_amount: i64,
    /// Read notifications older than this many days are deleted by cleanup.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Products expiring within this many days raise an expiring alert.
    #[serde(default = "default_expiry_lookahead_days")]
    pub expiry_lookahead_days: i64,
    /// Second, shorter lookahead used by the batch run for urgent expiries.
    #[serde(default = "default_expiry_urgent_days")]
    pub expiry_urgent_days: i64,
    /// Pending prescriptions expiring within this many days raise an alert.
    #[serde(default = "default_prescription_expiry_days")]
    pub prescription_expiry_days: i64,
    /// Deduplication windows.
    #[serde(default)]
    pub windows: DedupWindows,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            currency: default_currency(),
            significant_sale_amount: default_significant_sale_amount(),
            retention_days: default_retention_days(),
            expiry_lookahead_days: default_expiry_lookahead_days(),
            expiry_urgent_days: default_expiry_urgent_days(),
            prescription_expiry_days: default_prescription_expiry_days(),
            windows: DedupWindows::default(),
        }
    }
}

/// How long an alert suppresses an identical one, per alert path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupWindows {
    #[serde(default = "default_product_stock_hours")]
    pub product_stock_hours: i64,
    #[serde(default = "default_product_expiring_hours")]
    pub product_expiring_hours: i64,
    #[serde(default = "default_week_days")]
    pub product_expired_days: i64,
    #[serde(default = "default_sale_stock_hours")]
    pub sale_stock_hours: i64,
    #[serde(default = "default_batch_stock_hours")]
    pub batch_stock_hours: i64,
    #[serde(default = "default_week_days")]
    pub batch_expiring_days: i64,
    #[serde(default = "default_week_days")]
    pub batch_expired_days: i64,
    #[serde(default = "default_prescription_expiring_days")]
    pub prescription_expiring_days: i64,
    #[serde(default = "default_purchase_overdue_hours")]
    pub purchase_overdue_hours: i64,
}

impl DedupWindows {
    pub fn product_stock(&self) -> Duration {
        Duration::hours(self.product_stock_hours)
    }

    pub fn product_expiring(&self) -> Duration {
        Duration::hours(self.product_expiring_hours)
    }

    pub fn product_expired(&self) -> Duration {
        Duration::days(self.product_expired_days)
    }

    pub fn sale_stock(&self) -> Duration {
        Duration::hours(self.sale_stock_hours)
    }

    pub fn batch_stock(&self) -> Duration {
        Duration::hours(self.batch_stock_hours)
    }

    pub fn batch_expiring(&self) -> Duration {
        Duration::days(self.batch_expiring_days)
    }

    pub fn batch_expired(&self) -> Duration {
        Duration::days(self.batch_expired_days)
    }

    pub fn prescription_expiring(&self) -> Duration {
        Duration::days(self.prescription_expiring_days)
    }

    pub fn purchase_overdue(&self) -> Duration {
        Duration::hours(self.purchase_overdue_hours)
    }

    /// Every configured window value, labelled, for validation.
    pub(crate) fn labelled(&self) -> [(&'static str, i64); 9] {
        [
            ("product_stock_hours", self.product_stock_hours),
            ("product_expiring_hours", self.product_expiring_hours),
            ("product_expired_days", self.product_expired_days),
            ("sale_stock_hours", self.sale_stock_hours),
            ("batch_stock_hours", self.batch_stock_hours),
            ("batch_expiring_days", self.batch_expiring_days),
            ("batch_expired_days", self.batch_expired_days),
            ("prescription_expiring_days", self.prescription_expiring_days),
            ("purchase_overdue_hours", self.purchase_overdue_hours),
        ]
    }
}

impl Default for DedupWindows {
    fn default() -> Self {
        Self {
            product_stock_hours: default_product_stock_hours(),
            product_expiring_hours: default_product_expiring_hours(),
            product_expired_days: default_week_days(),
            sale_stock_hours: default_sale_stock_hours(),
            batch_stock_hours: default_batch_stock_hours(),
            batch_expiring_days: default_week_days(),
            batch_expired_days: default_week_days(),
            prescription_expiring_days: default_prescription_expiring_days(),
            purchase_overdue_hours: default_purchase_overdue_hours(),
        }
    }
}

fn default_base_url() -> String {
    String::new()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_significant_sale_amount() -> i64 {
    50
}

fn default_retention_days() -> i64 {
    30
}

fn default_expiry_lookahead_days() -> i64 {
    30
}

fn default_expiry_urgent_days() -> i64 {
    7
}

fn default_prescription_expiry_days() -> i64 {
    7
}

fn default_product_stock_hours() -> i64 {
    6
}

fn default_product_expiring_hours() -> i64 {
    24
}

fn default_week_days() -> i64 {
    7
}

fn default_sale_stock_hours() -> i64 {
    2
}

fn default_batch_stock_hours() -> i64 {
    24
}

fn default_prescription_expiring_days() -> i64 {
    3
}

fn default_purchase_overdue_hours() -> i64 {
    24
}
