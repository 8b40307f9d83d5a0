//! Product creation, edits and stock adjustments.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_database::store::ProductStore;
use pharmacy_entity::product::{NewProduct, Product, ProductUpdate};

use crate::events::{DomainEvent, EventBus};

/// Manages the product catalog. Every successful write is published on the
/// event bus so stock and expiry alerts can react.
#[derive(Debug, Clone)]
pub struct InventoryService {
    products: Arc<dyn ProductStore>,
    events: EventBus,
}

impl InventoryService {
    pub fn new(products: Arc<dyn ProductStore>, events: EventBus) -> Self {
        Self { products, events }
    }

    pub async fn find_product(&self, id: Uuid) -> AppResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))
    }

    pub async fn create_product(&self, input: NewProduct) -> AppResult<Product> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid product: {e}")))?;

        let product = self.products.create(input).await?;
        info!(
            product_id = %product.id,
            name = %product.name,
            stock = product.stock_quantity,
            "Product created"
        );

        self.events
            .publish(DomainEvent::ProductCreated(product.clone()))
            .await;
        Ok(product)
    }

    /// Apply a partial update. An empty update is a no-op and publishes nothing.
    pub async fn update_product(&self, id: Uuid, update: ProductUpdate) -> AppResult<Product> {
        let before = self.find_product(id).await?;
        if update.is_empty() {
            return Ok(before);
        }

        let after = update.apply_to(&before);
        if after.name.trim().is_empty() {
            return Err(AppError::validation("Product name cannot be empty"));
        }
        if after.stock_quantity < 0 {
            return Err(AppError::validation(format!(
                "Stock of {} cannot go below zero",
                after.name
            )));
        }
        if after.stock_threshold < 0 {
            return Err(AppError::validation("Stock threshold cannot be negative"));
        }

        let saved = self.products.update(&after).await?;
        self.events
            .publish(DomainEvent::ProductUpdated {
                before,
                after: saved.clone(),
            })
            .await;
        Ok(saved)
    }

    /// Add `delta` units (negative to remove) to the product's stock.
    pub async fn adjust_stock(&self, id: Uuid, delta: i32) -> AppResult<Product> {
        let current = self.find_product(id).await?;
        let quantity = current
            .stock_quantity
            .checked_add(delta)
            .ok_or_else(|| AppError::validation("Stock adjustment overflows"))?;
        self.update_product(id, ProductUpdate::stock(quantity)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use pharmacy_database::memory::MemoryStore;

    fn service(store: &MemoryStore) -> InventoryService {
        InventoryService::new(Arc::new(store.clone()), EventBus::default())
    }

    fn new_product(stock: i32) -> NewProduct {
        NewProduct {
            name: "Ventoline".to_string(),
            stock_quantity: stock,
            stock_threshold: 3,
            selling_price: Decimal::new(560, 2),
            expiry_date: None,
        }
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_negative_result() {
        let store = MemoryStore::new();
        let inventory = service(&store);
        let product = inventory.create_product(new_product(2)).await.unwrap();

        let err = inventory.adjust_stock(product.id, -3).await.unwrap_err();
        assert_eq!(err.kind, pharmacy_core::error::ErrorKind::Validation);

        let adjusted = inventory.adjust_stock(product.id, -2).await.unwrap();
        assert_eq!(adjusted.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_empty_update_is_a_no_op() {
        let store = MemoryStore::new();
        let inventory = service(&store);
        let product = inventory.create_product(new_product(5)).await.unwrap();
        let same = inventory
            .update_product(product.id, ProductUpdate::default())
            .await
            .unwrap();
        assert_eq!(same, product);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let inventory = service(&MemoryStore::new());
        let err = inventory.adjust_stock(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
