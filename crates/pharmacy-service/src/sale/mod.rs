//! Point-of-sale operations.

pub mod service;

pub use service::SaleService;
