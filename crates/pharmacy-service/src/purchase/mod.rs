//! Supplier purchase orders.

pub mod service;

pub use service::PurchaseService;
