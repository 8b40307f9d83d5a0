//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use pharmacy_core::config::AlertingConfig;
use pharmacy_database::memory::MemoryStore;
use pharmacy_database::store::{ProductStore, UserDirectory};
use pharmacy_entity::notification::Notification;
use pharmacy_entity::product::{NewProduct, Product};
use pharmacy_entity::user::{NewUser, User, UserRole};
use pharmacy_service::{ActorContext, Services, Stores};

/// Fully wired services over a fresh memory store, with one admin and one
/// pharmacist.
pub struct TestApp {
    pub store: MemoryStore,
    pub services: Services,
    pub admin: User,
    pub pharmacist: User,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AlertingConfig::default()).await
    }

    pub async fn with_config(settings: AlertingConfig) -> Self {
        let store = MemoryStore::new();
        let admin = UserDirectory::create(
            &store,
            NewUser::new("Mariama Diallo", "mariama@officine.test", UserRole::Admin),
        )
        .await
        .expect("Failed to create admin");
        let pharmacist = UserDirectory::create(
            &store,
            NewUser::new("Ousmane Ba", "ousmane@officine.test", UserRole::Pharmacist),
        )
        .await
        .expect("Failed to create pharmacist");

        let services = Services::build(Stores::shared(Arc::new(store.clone())), settings).await;

        Self {
            store,
            services,
            admin,
            pharmacist,
        }
    }

    pub fn admin_actor(&self) -> ActorContext {
        ActorContext::from(&self.admin)
    }

    pub fn pharmacist_actor(&self) -> ActorContext {
        ActorContext::from(&self.pharmacist)
    }

    /// Insert a product straight into the store, bypassing the observers.
    pub async fn seed_product(
        &self,
        name: &str,
        stock: i32,
        threshold: i32,
        expiry_date: Option<NaiveDate>,
    ) -> Product {
        ProductStore::create(&self.store, new_product(name, stock, threshold, expiry_date))
            .await
            .expect("Failed to seed product")
    }

    pub async fn product(&self, id: Uuid) -> Product {
        ProductStore::find_by_id(&self.store, id)
            .await
            .expect("Failed to load product")
            .expect("Product missing")
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.store
            .notifications()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }

    /// Notifications carrying `alert_key`, optionally restricted to one subject.
    pub fn with_key(&self, alert_key: &str, subject_id: Option<Uuid>) -> Vec<Notification> {
        self.store
            .notifications()
            .into_iter()
            .filter(|n| n.alert_key == alert_key)
            .filter(|n| subject_id.is_none() || n.subject_id == subject_id)
            .collect()
    }
}

pub fn new_product(
    name: &str,
    stock: i32,
    threshold: i32,
    expiry_date: Option<NaiveDate>,
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        stock_quantity: stock,
        stock_threshold: threshold,
        selling_price: Decimal::new(2500, 2),
        expiry_date,
    }
}
