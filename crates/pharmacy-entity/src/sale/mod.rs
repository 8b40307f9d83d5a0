//! Sale entities.

pub mod model;
pub mod payment;

pub use model::{NewSale, NewSaleItem, Sale, SaleDetails, SaleItem};
pub use payment::PaymentStatus;
