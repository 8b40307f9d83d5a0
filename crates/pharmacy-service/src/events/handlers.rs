//! Event handler impls for the alert observers.

use async_trait::async_trait;

use super::registry::EventHandler;
use super::{DomainEvent, EventKind};
use crate::alerting::{AlertOutcome, PrescriptionAlerts, ProductAlerts, PurchaseAlerts, SaleAlerts};

#[async_trait]
impl EventHandler for ProductAlerts {
    fn name(&self) -> &'static str {
        "product_alerts"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::ProductCreated, EventKind::ProductUpdated]
    }

    async fn handle(&self, event: &DomainEvent) -> AlertOutcome {
        match event {
            DomainEvent::ProductCreated(product) => self.on_created(product).await,
            DomainEvent::ProductUpdated { before, after } => self.on_updated(before, after).await,
            _ => AlertOutcome::default(),
        }
    }
}

#[async_trait]
impl EventHandler for SaleAlerts {
    fn name(&self) -> &'static str {
        "sale_alerts"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::SaleCreated, EventKind::SaleUpdated]
    }

    async fn handle(&self, event: &DomainEvent) -> AlertOutcome {
        match event {
            DomainEvent::SaleCreated(details) => self.on_created(details).await,
            DomainEvent::SaleUpdated {
                previous_payment_status,
                sale,
            } => self.on_payment_updated(*previous_payment_status, sale).await,
            _ => AlertOutcome::default(),
        }
    }
}

#[async_trait]
impl EventHandler for PrescriptionAlerts {
    fn name(&self) -> &'static str {
        "prescription_alerts"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::PrescriptionCreated, EventKind::PrescriptionUpdated]
    }

    async fn handle(&self, event: &DomainEvent) -> AlertOutcome {
        match event {
            DomainEvent::PrescriptionCreated(details) => self.on_created(details).await,
            DomainEvent::PrescriptionUpdated {
                previous_status,
                prescription,
            } => self.on_updated(*previous_status, prescription).await,
            _ => AlertOutcome::default(),
        }
    }
}

#[async_trait]
impl EventHandler for PurchaseAlerts {
    fn name(&self) -> &'static str {
        "purchase_alerts"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::PurchaseCreated, EventKind::PurchaseUpdated]
    }

    async fn handle(&self, event: &DomainEvent) -> AlertOutcome {
        match event {
            DomainEvent::PurchaseCreated(purchase) => self.on_created(purchase).await,
            DomainEvent::PurchaseUpdated {
                previous_status,
                purchase,
            } => self.on_updated(*previous_status, purchase).await,
            _ => AlertOutcome::default(),
        }
    }
}
