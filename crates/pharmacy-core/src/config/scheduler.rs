//! Scheduled reconciliation configuration.

use serde::{Deserialize, Serialize};

/// Cron expressions (with seconds field) for the reconciliation jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Checks during opening hours.
    #[serde(default = "default_business_hours_cron")]
    pub business_hours_cron: String,
    /// Checks outside opening hours.
    #[serde(default = "default_off_hours_cron")]
    pub off_hours_cron: String,
    /// Full run (checks + cleanup) once a day.
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,
    /// Nightly cleanup of old read notifications.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            business_hours_cron: default_business_hours_cron(),
            off_hours_cron: default_off_hours_cron(),
            daily_cron: default_daily_cron(),
            cleanup_cron: default_cleanup_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_business_hours_cron() -> String {
    "0 */30 8-19 * * *".to_string()
}

fn default_off_hours_cron() -> String {
    "0 0 0,2,4,6,20,22 * * *".to_string()
}

fn default_daily_cron() -> String {
    "0 0 7 * * *".to_string()
}

fn default_cleanup_cron() -> String {
    "0 0 3 * * *".to_string()
}
