//! Alert detection and emission.
//!
//! Each observer turns an entity change into zero or more [`Alert`]s;
//! the [`AlertEmitter`] deduplicates them and writes one notification per
//! recipient. Failures are counted in an [`AlertOutcome`], never raised.

pub mod emitter;
pub mod outcome;
pub mod prescription;
pub mod product;
pub mod purchase;
pub mod recipients;
pub mod sale;

pub use emitter::{Alert, AlertEmitter, Dedup, Delivery, Emission, LinkBuilder};
pub use outcome::AlertOutcome;
pub use prescription::PrescriptionAlerts;
pub use product::ProductAlerts;
pub use purchase::PurchaseAlerts;
pub use recipients::{Audience, RecipientResolver, select_recipients};
pub use sale::SaleAlerts;
