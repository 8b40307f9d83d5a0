//! Scheduled re-scan of the catalog and notification housekeeping.

pub mod report;
pub mod service;

pub use report::{AlertState, AlertSummary, PhaseReport, ReconciliationReport};
pub use service::ReconciliationService;
