//! Storage traits consumed by the service layer.
//!
//! Each trait has a PostgreSQL implementation in [`crate::repositories`]
//! and an in-memory one in `crate::memory`.

pub mod inventory;
pub mod notification;
pub mod user;

pub use inventory::{
    PrescriptionDraft, PrescriptionStore, ProductStore, PurchaseDraft, PurchaseStore,
    RecordedSale, SaleDraft, SaleLine, SaleStore,
};
pub use notification::NotificationStore;
pub use user::UserDirectory;
