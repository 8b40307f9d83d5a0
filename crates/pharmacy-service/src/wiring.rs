//! Construction of the service graph.
//!
//! The daemon, the CLI and the tests all build the same graph: one emitter,
//! the four alert observers subscribed on a shared [`EventBus`], and the
//! mutation services publishing into that bus.

use std::sync::Arc;

use tracing::info;

use pharmacy_core::config::AlertingConfig;
use pharmacy_database::DatabasePool;
use pharmacy_database::repositories::{
    NotificationRepository, PrescriptionRepository, ProductRepository, PurchaseRepository,
    SaleRepository, UserRepository,
};
use pharmacy_database::store::{
    NotificationStore, PrescriptionStore, ProductStore, PurchaseStore, SaleStore, UserDirectory,
};

use crate::alerting::{
    AlertEmitter, LinkBuilder, PrescriptionAlerts, ProductAlerts, PurchaseAlerts,
    RecipientResolver, SaleAlerts,
};
use crate::events::EventBus;
use crate::inventory::InventoryService;
use crate::notification::NotificationService;
use crate::prescription::PrescriptionService;
use crate::purchase::PurchaseService;
use crate::reconciliation::ReconciliationService;
use crate::sale::SaleService;

/// Every storage seam the services need.
#[derive(Debug, Clone)]
pub struct Stores {
    pub notifications: Arc<dyn NotificationStore>,
    pub users: Arc<dyn UserDirectory>,
    pub products: Arc<dyn ProductStore>,
    pub sales: Arc<dyn SaleStore>,
    pub prescriptions: Arc<dyn PrescriptionStore>,
    pub purchases: Arc<dyn PurchaseStore>,
}

impl Stores {
    /// PostgreSQL repositories sharing one pool.
    pub fn from_pool(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
            sales: Arc::new(SaleRepository::new(pool.clone())),
            prescriptions: Arc::new(PrescriptionRepository::new(pool.clone())),
            purchases: Arc::new(PurchaseRepository::new(pool)),
        }
    }

    /// One value implementing every store, such as the in-memory store.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: NotificationStore
            + UserDirectory
            + ProductStore
            + SaleStore
            + PrescriptionStore
            + PurchaseStore,
    {
        Self {
            notifications: store.clone(),
            users: store.clone(),
            products: store.clone(),
            sales: store.clone(),
            prescriptions: store.clone(),
            purchases: store,
        }
    }
}

/// The assembled services.
#[derive(Debug, Clone)]
pub struct Services {
    pub events: EventBus,
    pub emitter: Arc<AlertEmitter>,
    pub inventory: Arc<InventoryService>,
    pub sales: Arc<SaleService>,
    pub prescriptions: Arc<PrescriptionService>,
    pub purchases: Arc<PurchaseService>,
    pub notifications: Arc<NotificationService>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl Services {
    pub async fn build(stores: Stores, settings: AlertingConfig) -> Self {
        let settings = Arc::new(settings);
        let emitter = Arc::new(AlertEmitter::new(
            Arc::clone(&stores.notifications),
            RecipientResolver::new(Arc::clone(&stores.users)),
            LinkBuilder::new(settings.base_url.clone()),
        ));

        let events = EventBus::default();
        events
            .subscribe(Arc::new(ProductAlerts::new(
                Arc::clone(&emitter),
                Arc::clone(&settings),
            )))
            .await;
        events
            .subscribe(Arc::new(SaleAlerts::new(
                Arc::clone(&emitter),
                Arc::clone(&stores.products),
                Arc::clone(&settings),
            )))
            .await;
        events
            .subscribe(Arc::new(PrescriptionAlerts::new(
                Arc::clone(&emitter),
                Arc::clone(&stores.users),
                Arc::clone(&settings),
            )))
            .await;
        events
            .subscribe(Arc::new(PurchaseAlerts::new(
                Arc::clone(&emitter),
                Arc::clone(&stores.users),
                Arc::clone(&settings),
            )))
            .await;
        info!("Alert observers subscribed");

        Self {
            inventory: Arc::new(InventoryService::new(
                Arc::clone(&stores.products),
                events.clone(),
            )),
            sales: Arc::new(SaleService::new(
                Arc::clone(&stores.sales),
                Arc::clone(&stores.products),
                Arc::clone(&stores.users),
                events.clone(),
            )),
            prescriptions: Arc::new(PrescriptionService::new(
                Arc::clone(&stores.prescriptions),
                Arc::clone(&stores.products),
                events.clone(),
            )),
            purchases: Arc::new(PurchaseService::new(
                Arc::clone(&stores.purchases),
                events.clone(),
            )),
            notifications: Arc::new(NotificationService::new(
                Arc::clone(&stores.notifications),
                Arc::clone(&emitter),
            )),
            reconciliation: Arc::new(ReconciliationService::new(
                Arc::clone(&stores.products),
                Arc::clone(&stores.prescriptions),
                Arc::clone(&stores.purchases),
                Arc::clone(&stores.notifications),
                Arc::clone(&emitter),
                settings,
            )),
            events,
            emitter,
        }
    }
}
