//! Per-user notification queries and ad-hoc alerts.

pub mod service;

pub use service::{CustomNotification, NotificationService};
