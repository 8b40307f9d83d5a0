//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a default so a missing file still loads.

pub mod alerting;
pub mod database;
pub mod logging;
pub mod scheduler;

use serde::{Deserialize, Serialize};

pub use self::alerting::{AlertingConfig, DedupWindows};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Reconciliation schedule.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Alert thresholds and dedup windows.
    #[serde(default)]
    pub alerting: AlertingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment.
    ///
    /// Merges `config/default.toml`, an optional `config/{env}.toml` overlay
    /// and environment variables prefixed with `PHARMACY__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration using an explicit base file instead of `config/default`.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PHARMACY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings that would make the alerting pipeline misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        if self.alerting.significant_sale_amount < 0 {
            return Err(AppError::configuration(
                "alerting.significant_sale_amount must not be negative",
            ));
        }
        if self.alerting.retention_days <= 0 {
            return Err(AppError::configuration(
                "alerting.retention_days must be positive",
            ));
        }
        for (name, value) in self.alerting.windows.labelled() {
            if value <= 0 {
                return Err(AppError::configuration(format!(
                    "alerting.windows.{name} must be positive"
                )));
            }
        }
        Ok(())
    }
}
