//! Scheduled alert work for the pharmacy back-office.
//!
//! This crate provides:
//! - A cron scheduler firing the reconciliation checks and cleanup
//! - A job executor that dispatches each firing to the correct handler
//! - The reconciliation job handler wrapping `ReconciliationService`

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
