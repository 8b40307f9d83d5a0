//! Registering prescriptions, delivering their items and keeping their
//! status in step with deliveries and the calendar.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_database::store::{PrescriptionDraft, PrescriptionStore, ProductStore};
use pharmacy_entity::prescription::{ItemDelivery, NewPrescription, PrescriptionDetails};
use pharmacy_entity::product::Product;

use crate::context::ActorContext;
use crate::events::{DomainEvent, EventBus};
use crate::numbering::{PRESCRIPTION_PREFIX, reference_number};

#[derive(Debug, Clone)]
pub struct PrescriptionService {
    prescriptions: Arc<dyn PrescriptionStore>,
    products: Arc<dyn ProductStore>,
    events: EventBus,
}

impl PrescriptionService {
    pub fn new(
        prescriptions: Arc<dyn PrescriptionStore>,
        products: Arc<dyn ProductStore>,
        events: EventBus,
    ) -> Self {
        Self {
            prescriptions,
            products,
            events,
        }
    }

    pub async fn find(&self, id: Uuid) -> AppResult<PrescriptionDetails> {
        self.prescriptions
            .find_details(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prescription {id} not found")))
    }

    pub async fn create(
        &self,
        input: NewPrescription,
        actor: &ActorContext,
    ) -> AppResult<PrescriptionDetails> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid prescription: {e}")))?;
        if input.expiry_date < input.prescription_date {
            return Err(AppError::validation(
                "Prescription cannot expire before it was written",
            ));
        }
        for item in &input.items {
            if self.products.find_by_id(item.product_id).await?.is_none() {
                return Err(AppError::not_found(format!(
                    "Product {} not found",
                    item.product_id
                )));
            }
        }

        let details = self
            .prescriptions
            .create(PrescriptionDraft {
                prescription_number: reference_number(PRESCRIPTION_PREFIX, Utc::now().date_naive()),
                client_name: input.client_name,
                doctor_name: input.doctor_name,
                prescription_date: input.prescription_date,
                expiry_date: input.expiry_date,
                created_by: actor.user_id,
                items: input
                    .items
                    .into_iter()
                    .map(|i| (i.product_id, i.quantity_prescribed, i.dosage_instructions))
                    .collect(),
            })
            .await?;

        info!(
            prescription_id = %details.prescription.id,
            prescription_number = %details.prescription.prescription_number,
            items = details.items.len(),
            "Prescription registered"
        );
        self.events
            .publish(DomainEvent::PrescriptionCreated(details.clone()))
            .await;
        Ok(details)
    }

    /// Hand over quantities for some items, decrementing stock, then bring
    /// the status up to date.
    pub async fn deliver(
        &self,
        prescription_id: Uuid,
        deliveries: Vec<ItemDelivery>,
        actor: &ActorContext,
    ) -> AppResult<PrescriptionDetails> {
        if deliveries.is_empty() {
            return Err(AppError::validation("Nothing to deliver"));
        }
        for delivery in &deliveries {
            delivery
                .validate()
                .map_err(|e| AppError::validation(format!("Invalid delivery: {e}")))?;
        }

        let current = self.find(prescription_id).await?;
        let today = Utc::now().date_naive();
        if current.prescription.is_expired(today) {
            return Err(AppError::conflict(format!(
                "Prescription {} expired on {}",
                current.prescription.prescription_number, current.prescription.expiry_date
            )));
        }
        if !current.prescription.status.accepts_deliveries() {
            return Err(AppError::conflict(format!(
                "Prescription {} is {} and accepts no deliveries",
                current.prescription.prescription_number, current.prescription.status
            )));
        }

        let mut per_item: HashMap<Uuid, i32> = HashMap::new();
        let mut per_product: HashMap<Uuid, i32> = HashMap::new();
        for delivery in &deliveries {
            let item = current
                .items
                .iter()
                .find(|i| i.id == delivery.item_id)
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "Item {} does not belong to this prescription",
                        delivery.item_id
                    ))
                })?;
            let item_total = per_item.entry(item.id).or_insert(0);
            *item_total += delivery.quantity;
            if *item_total > item.remaining_quantity() {
                return Err(AppError::validation(format!(
                    "Only {} unit(s) left to deliver for item {}",
                    item.remaining_quantity(),
                    item.id
                )));
            }
            *per_product.entry(item.product_id).or_insert(0) += delivery.quantity;
        }

        let mut before: HashMap<Uuid, Product> = HashMap::new();
        for (product_id, quantity) in &per_product {
            let product = self.products.find_by_id(*product_id).await?.ok_or_else(|| {
                AppError::validation(format!("Product unavailable (ID: {product_id})"))
            })?;
            if product.stock_quantity < *quantity {
                return Err(AppError::validation(format!(
                    "Insufficient stock for {}: {} requested, {} available",
                    product.name, quantity, product.stock_quantity
                )));
            }
            before.insert(product.id, product);
        }

        let (details, products) = self
            .prescriptions
            .record_deliveries(prescription_id, &deliveries)
            .await?;
        info!(
            prescription_id = %prescription_id,
            deliveries = deliveries.len(),
            delivered_by = %actor.name,
            "Prescription items delivered"
        );

        for after in products {
            if let Some(previous) = before.remove(&after.id) {
                self.events
                    .publish(DomainEvent::ProductUpdated {
                        before: previous,
                        after,
                    })
                    .await;
            }
        }

        self.apply_status(details, Some(actor.user_id)).await
    }

    /// Recompute the status from items and calendar; saves and publishes
    /// only when it changed. Safe to call any number of times.
    pub async fn refresh_status(&self, prescription_id: Uuid) -> AppResult<PrescriptionDetails> {
        let details = self.find(prescription_id).await?;
        self.apply_status(details, None).await
    }

    async fn apply_status(
        &self,
        mut details: PrescriptionDetails,
        actor: Option<Uuid>,
    ) -> AppResult<PrescriptionDetails> {
        let previous = details.prescription.status;
        let now = Utc::now();
        if !details
            .prescription
            .refresh_status(&details.items, now.date_naive(), now, actor)
        {
            debug!(
                prescription_id = %details.prescription.id,
                status = %previous,
                "Prescription status unchanged"
            );
            return Ok(details);
        }

        details.prescription = self.prescriptions.save(&details.prescription).await?;
        info!(
            prescription_id = %details.prescription.id,
            from = %previous,
            to = %details.prescription.status,
            "Prescription status changed"
        );
        self.events
            .publish(DomainEvent::PrescriptionUpdated {
                previous_status: previous,
                prescription: details.clone(),
            })
            .await;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    use pharmacy_database::memory::MemoryStore;
    use pharmacy_entity::prescription::{NewPrescriptionItem, PrescriptionStatus};
    use pharmacy_entity::product::NewProduct;
    use pharmacy_entity::user::UserRole;

    fn service(store: &MemoryStore) -> PrescriptionService {
        let shared = Arc::new(store.clone());
        PrescriptionService::new(shared.clone(), shared, EventBus::default())
    }

    fn actor() -> ActorContext {
        ActorContext::new(Uuid::new_v4(), "Ousmane", UserRole::Pharmacist)
    }

    async fn registered(store: &MemoryStore, prescribed: i32, stock: i32) -> PrescriptionDetails {
        let product = ProductStore::create(
            store,
            NewProduct {
                name: "Augmentin".to_string(),
                stock_quantity: stock,
                stock_threshold: 1,
                selling_price: Decimal::from(8),
                expiry_date: None,
            },
        )
        .await
        .unwrap();
        let today = Utc::now().date_naive();
        service(store)
            .create(
                NewPrescription {
                    client_name: "Awa Ndiaye".to_string(),
                    doctor_name: "Dr Sow".to_string(),
                    prescription_date: today,
                    expiry_date: today + Duration::days(30),
                    items: vec![NewPrescriptionItem {
                        product_id: product.id,
                        quantity_prescribed: prescribed,
                        dosage_instructions: Some("2x/day".to_string()),
                    }],
                },
                &actor(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_partial_then_complete() {
        let store = MemoryStore::new();
        let created = registered(&store, 4, 10).await;
        let item = created.items[0].id;
        let actor = actor();

        let partial = service(&store)
            .deliver(created.prescription.id, vec![ItemDelivery { item_id: item, quantity: 1 }], &actor)
            .await
            .unwrap();
        assert_eq!(partial.prescription.status, PrescriptionStatus::PartiallyDelivered);

        let done = service(&store)
            .deliver(created.prescription.id, vec![ItemDelivery { item_id: item, quantity: 3 }], &actor)
            .await
            .unwrap();
        assert_eq!(done.prescription.status, PrescriptionStatus::Completed);
        assert_eq!(done.prescription.delivered_by, Some(actor.user_id));
        assert!(done.prescription.delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_over_delivery_is_rejected() {
        let store = MemoryStore::new();
        let created = registered(&store, 2, 10).await;
        let err = service(&store)
            .deliver(
                created.prescription.id,
                vec![ItemDelivery {
                    item_id: created.items[0].id,
                    quantity: 3,
                }],
                &actor(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, pharmacy_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_refresh_without_change_keeps_timestamps() {
        let store = MemoryStore::new();
        let created = registered(&store, 2, 10).await;
        let refreshed = service(&store)
            .refresh_status(created.prescription.id)
            .await
            .unwrap();
        assert_eq!(refreshed.prescription, created.prescription);
    }
}
