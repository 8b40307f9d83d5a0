//! Built-in job handler implementations.

pub mod reconciliation;

pub use reconciliation::{ReconciliationJobHandler, ReconciliationTask};
