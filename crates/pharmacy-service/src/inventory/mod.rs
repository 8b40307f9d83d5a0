//! Product catalog and stock management.

pub mod service;

pub use service::InventoryService;
