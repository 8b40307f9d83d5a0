//! Placing purchase orders and tracking their receipt.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_database::store::{PurchaseDraft, PurchaseStore};
use pharmacy_entity::purchase::{NewPurchase, Purchase, PurchaseStatus};

use crate::context::ActorContext;
use crate::events::{DomainEvent, EventBus};
use crate::numbering::{PURCHASE_PREFIX, reference_number};

#[derive(Debug, Clone)]
pub struct PurchaseService {
    purchases: Arc<dyn PurchaseStore>,
    events: EventBus,
}

impl PurchaseService {
    pub fn new(purchases: Arc<dyn PurchaseStore>, events: EventBus) -> Self {
        Self { purchases, events }
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Purchase> {
        self.purchases
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Purchase {id} not found")))
    }

    pub async fn create(&self, input: NewPurchase, actor: &ActorContext) -> AppResult<Purchase> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid purchase: {e}")))?;
        if input.total_amount < Decimal::ZERO {
            return Err(AppError::validation("Purchase amount cannot be negative"));
        }
        if input
            .expected_date
            .is_some_and(|expected| expected < input.order_date)
        {
            return Err(AppError::validation(
                "Expected delivery date cannot precede the order date",
            ));
        }

        let purchase = self
            .purchases
            .create(PurchaseDraft {
                purchase_number: reference_number(PURCHASE_PREFIX, Utc::now().date_naive()),
                created_by: actor.user_id,
                input,
            })
            .await?;

        info!(
            purchase_id = %purchase.id,
            purchase_number = %purchase.purchase_number,
            supplier = %purchase.supplier_name,
            "Purchase order placed"
        );
        self.events
            .publish(DomainEvent::PurchaseCreated(purchase.clone()))
            .await;
        Ok(purchase)
    }

    /// Move the order to `status`.
    ///
    /// Received and cancelled orders are final. Saving an order in its
    /// current status still counts as an update, which re-runs the overdue
    /// check.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
        actor: &ActorContext,
    ) -> AppResult<Purchase> {
        let current = self.find(id).await?;
        if current.status.is_terminal() && current.status != status {
            return Err(AppError::conflict(format!(
                "Purchase {} is {} and can no longer change",
                current.purchase_number, current.status
            )));
        }

        let mut next = current.clone();
        if status == PurchaseStatus::Received && current.status != PurchaseStatus::Received {
            next.received_items = next.total_items;
            next.received_date = Some(Utc::now().date_naive());
            next.received_by = Some(actor.user_id);
        }
        next.status = status;
        self.save(current.status, next).await
    }

    /// Record how many items have arrived so far; the status follows.
    pub async fn record_receipt(
        &self,
        id: Uuid,
        received_items: i32,
        actor: &ActorContext,
    ) -> AppResult<Purchase> {
        let current = self.find(id).await?;
        if current.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Purchase {} is {} and can no longer change",
                current.purchase_number, current.status
            )));
        }
        if !(0..=current.total_items).contains(&received_items) {
            return Err(AppError::validation(format!(
                "Received items must be between 0 and {}",
                current.total_items
            )));
        }

        let mut next = current.clone();
        next.received_items = received_items;
        next.status = if received_items >= current.total_items {
            next.received_date = Some(Utc::now().date_naive());
            next.received_by = Some(actor.user_id);
            PurchaseStatus::Received
        } else if received_items > 0 {
            PurchaseStatus::PartiallyReceived
        } else {
            PurchaseStatus::Pending
        };
        self.save(current.status, next).await
    }

    async fn save(&self, previous: PurchaseStatus, mut next: Purchase) -> AppResult<Purchase> {
        next.updated_at = Utc::now();
        let saved = self.purchases.save(&next).await?;
        if previous != saved.status {
            info!(
                purchase_id = %saved.id,
                from = %previous,
                to = %saved.status,
                "Purchase status changed"
            );
        }
        self.events
            .publish(DomainEvent::PurchaseUpdated {
                previous_status: previous,
                purchase: saved.clone(),
            })
            .await;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use pharmacy_database::memory::MemoryStore;
    use pharmacy_entity::user::UserRole;

    fn service(store: &MemoryStore) -> PurchaseService {
        PurchaseService::new(Arc::new(store.clone()), EventBus::default())
    }

    fn actor() -> ActorContext {
        ActorContext::new(Uuid::new_v4(), "Khady", UserRole::Admin)
    }

    fn order(total_items: i32) -> NewPurchase {
        let today = Utc::now().date_naive();
        NewPurchase {
            supplier_name: "Copharmed".to_string(),
            order_date: today,
            expected_date: Some(today + Duration::days(5)),
            total_amount: Decimal::from(900),
            total_items,
        }
    }

    #[tokio::test]
    async fn test_receipt_progression() {
        let store = MemoryStore::new();
        let purchases = service(&store);
        let actor = actor();
        let purchase = purchases.create(order(20), &actor).await.unwrap();
        assert!(purchase.purchase_number.starts_with("ACH-"));

        let partial = purchases.record_receipt(purchase.id, 5, &actor).await.unwrap();
        assert_eq!(partial.status, PurchaseStatus::PartiallyReceived);

        let full = purchases.record_receipt(purchase.id, 20, &actor).await.unwrap();
        assert_eq!(full.status, PurchaseStatus::Received);
        assert_eq!(full.received_by, Some(actor.user_id));
        assert!(full.received_date.is_some());
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let store = MemoryStore::new();
        let purchases = service(&store);
        let actor = actor();
        let purchase = purchases.create(order(3), &actor).await.unwrap();
        purchases
            .update_status(purchase.id, PurchaseStatus::Cancelled, &actor)
            .await
            .unwrap();

        let err = purchases
            .update_status(purchase.id, PurchaseStatus::Received, &actor)
            .await
            .unwrap_err();
        assert_eq!(err.kind, pharmacy_core::error::ErrorKind::Conflict);

        let same = purchases
            .update_status(purchase.id, PurchaseStatus::Cancelled, &actor)
            .await
            .unwrap();
        assert_eq!(same.status, PurchaseStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_expected_before_order_is_rejected() {
        let store = MemoryStore::new();
        let mut input = order(3);
        input.expected_date = Some(input.order_date - Duration::days(1));
        let err = service(&store).create(input, &actor()).await.unwrap_err();
        assert_eq!(err.kind, pharmacy_core::error::ErrorKind::Validation);
    }
}
