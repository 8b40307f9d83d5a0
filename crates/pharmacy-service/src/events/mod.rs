//! Domain events published by the mutation services after a successful write.

pub mod bus;
pub mod handlers;
pub mod registry;

use std::fmt;

use serde::Serialize;

use pharmacy_entity::notification::AlertSubject;
use pharmacy_entity::prescription::{PrescriptionDetails, PrescriptionStatus};
use pharmacy_entity::product::Product;
use pharmacy_entity::purchase::{Purchase, PurchaseStatus};
use pharmacy_entity::sale::{PaymentStatus, SaleDetails};

pub use bus::{DispatchReport, EventBus};
pub use registry::{EventHandler, EventRegistry};

/// Something that happened to a business entity, with the state needed to
/// evaluate alert conditions.
#[derive(Debug, Clone, Serialize)]
pub enum DomainEvent {
    ProductCreated(Product),
    ProductUpdated {
        before: Product,
        after: Product,
    },
    SaleCreated(SaleDetails),
    SaleUpdated {
        previous_payment_status: PaymentStatus,
        sale: SaleDetails,
    },
    PrescriptionCreated(PrescriptionDetails),
    PrescriptionUpdated {
        previous_status: PrescriptionStatus,
        prescription: PrescriptionDetails,
    },
    PurchaseCreated(Purchase),
    PurchaseUpdated {
        previous_status: PurchaseStatus,
        purchase: Purchase,
    },
}

/// Discriminant of [`DomainEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProductCreated,
    ProductUpdated,
    SaleCreated,
    SaleUpdated,
    PrescriptionCreated,
    PrescriptionUpdated,
    PurchaseCreated,
    PurchaseUpdated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCreated => "product_created",
            Self::ProductUpdated => "product_updated",
            Self::SaleCreated => "sale_created",
            Self::SaleUpdated => "sale_updated",
            Self::PrescriptionCreated => "prescription_created",
            Self::PrescriptionUpdated => "prescription_updated",
            Self::PurchaseCreated => "purchase_created",
            Self::PurchaseUpdated => "purchase_updated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ProductCreated(_) => EventKind::ProductCreated,
            Self::ProductUpdated { .. } => EventKind::ProductUpdated,
            Self::SaleCreated(_) => EventKind::SaleCreated,
            Self::SaleUpdated { .. } => EventKind::SaleUpdated,
            Self::PrescriptionCreated(_) => EventKind::PrescriptionCreated,
            Self::PrescriptionUpdated { .. } => EventKind::PrescriptionUpdated,
            Self::PurchaseCreated(_) => EventKind::PurchaseCreated,
            Self::PurchaseUpdated { .. } => EventKind::PurchaseUpdated,
        }
    }

    /// The entity the event is about.
    pub fn subject(&self) -> AlertSubject {
        match self {
            Self::ProductCreated(product) | Self::ProductUpdated { after: product, .. } => {
                AlertSubject::Product(product.id)
            }
            Self::SaleCreated(details) | Self::SaleUpdated { sale: details, .. } => {
                AlertSubject::Sale(details.sale.id)
            }
            Self::PrescriptionCreated(details)
            | Self::PrescriptionUpdated {
                prescription: details,
                ..
            } => AlertSubject::Prescription(details.prescription.id),
            Self::PurchaseCreated(purchase) | Self::PurchaseUpdated { purchase, .. } => {
                AlertSubject::Purchase(purchase.id)
            }
        }
    }
}
