//! Supplier purchase entities.

pub mod model;
pub mod status;

pub use model::{NewPurchase, Purchase};
pub use status::PurchaseStatus;
