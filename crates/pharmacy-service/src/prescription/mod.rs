//! Prescription registration and dispensing.

pub mod service;

pub use service::PrescriptionService;
