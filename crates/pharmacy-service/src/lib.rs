//! # pharmacy-service
//!
//! Business logic of the back-office. Mutation services persist inventory,
//! sales, prescriptions and purchases, then publish domain events; alert
//! observers subscribed on the [`EventBus`] turn those events into
//! deduplicated notifications. The [`ReconciliationService`] re-runs the
//! product checks over the whole catalog on a schedule.
//!
//! Services follow constructor injection: every dependency is handed over
//! as an `Arc` at construction time.

pub mod alerting;
pub mod context;
pub mod events;
pub mod inventory;
pub mod notification;
pub mod numbering;
pub mod prescription;
pub mod purchase;
pub mod reconciliation;
pub mod sale;
pub mod wiring;

pub use alerting::{AlertEmitter, AlertOutcome, RecipientResolver};
pub use context::ActorContext;
pub use events::{DomainEvent, EventBus, EventHandler};
pub use inventory::InventoryService;
pub use notification::NotificationService;
pub use prescription::PrescriptionService;
pub use purchase::PurchaseService;
pub use reconciliation::{ReconciliationReport, ReconciliationService};
pub use sale::SaleService;
pub use wiring::{Services, Stores};
