//! Prescription entities and status recomputation.

pub mod item;
pub mod model;
pub mod status;

pub use item::{ItemDelivery, NewPrescriptionItem, PrescriptionItem};
pub use model::{NewPrescription, Prescription, PrescriptionDetails, delivery_progress};
pub use status::PrescriptionStatus;
