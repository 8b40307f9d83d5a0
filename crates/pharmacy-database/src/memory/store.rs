//! In-memory implementation of every store trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_core::types::{PageRequest, PageResponse};
use pharmacy_entity::notification::{
    AlertSubject, DuplicateQuery, NewNotification, Notification, NotificationCount,
    NotificationType,
};
use pharmacy_entity::prescription::{
    ItemDelivery, Prescription, PrescriptionDetails, PrescriptionItem, PrescriptionStatus,
};
use pharmacy_entity::product::{NewProduct, Product};
use pharmacy_entity::purchase::{Purchase, PurchaseStatus};
use pharmacy_entity::sale::{PaymentStatus, Sale, SaleItem};
use pharmacy_entity::user::{NewUser, User};

use crate::store::{
    NotificationStore, PrescriptionDraft, PrescriptionStore, ProductStore, PurchaseDraft,
    PurchaseStore, RecordedSale, SaleDraft, SaleStore, UserDirectory,
};

#[derive(Debug, Default)]
struct Inventory {
    products: HashMap<Uuid, Product>,
    sales: HashMap<Uuid, Sale>,
    sale_items: Vec<SaleItem>,
    prescriptions: HashMap<Uuid, Prescription>,
    prescription_items: Vec<PrescriptionItem>,
    purchases: HashMap<Uuid, Purchase>,
}

impl Inventory {
    fn prescription_details(&self, id: Uuid) -> Option<PrescriptionDetails> {
        self.prescriptions.get(&id).map(|p| PrescriptionDetails {
            prescription: p.clone(),
            items: self
                .prescription_items
                .iter()
                .filter(|i| i.prescription_id == id)
                .cloned()
                .collect(),
        })
    }

    /// Check every stock decrement before applying any of them.
    fn ensure_stock(&self, wanted: &[(Uuid, i32)]) -> AppResult<()> {
        let mut needed: HashMap<Uuid, i32> = HashMap::new();
        for (product_id, quantity) in wanted {
            *needed.entry(*product_id).or_default() += quantity;
        }
        for (product_id, quantity) in needed {
            let available = self
                .products
                .get(&product_id)
                .map(|p| p.stock_quantity)
                .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
            if available < quantity {
                return Err(AppError::conflict(format!(
                    "Insufficient stock for product {product_id} (requested {quantity})"
                )));
            }
        }
        Ok(())
    }

    fn take_stock(&mut self, wanted: &[(Uuid, i32)], now: DateTime<Utc>) -> Vec<Product> {
        let mut touched: Vec<Uuid> = Vec::new();
        for (product_id, quantity) in wanted {
            if let Some(product) = self.products.get_mut(product_id) {
                product.stock_quantity -= quantity;
                product.updated_at = now;
            }
            if !touched.contains(product_id) {
                touched.push(*product_id);
            }
        }
        touched
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect()
    }
}

/// Process-local store backing tests and dry runs.
///
/// Notifications and users live in concurrent maps; business entities sit
/// behind one mutex so multi-row writes stay atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    notifications: Arc<DashMap<Uuid, Notification>>,
    users: Arc<DashMap<Uuid, User>>,
    inventory: Arc<Mutex<Inventory>>,
    fail_notification_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed notification, e.g. one backdated for a test.
    pub fn insert_notification(&self, notification: Notification) {
        self.notifications.insert(notification.id, notification);
    }

    /// Every stored notification, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut all: Vec<Notification> =
            self.notifications.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|n| (n.created_at, n.id));
        all
    }

    /// Make notification inserts fail until switched back off.
    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail_notification_writes.store(fail, Ordering::SeqCst);
    }

    /// Drop a product, leaving references to it dangling.
    pub async fn remove_product(&self, id: Uuid) -> Option<Product> {
        self.inventory.lock().await.products.remove(&id)
    }

    /// Overwrite a product row as-is, bypassing the service layer.
    pub async fn put_product(&self, product: Product) {
        self.inventory
            .lock()
            .await
            .products
            .insert(product.id, product);
    }

    /// Overwrite a prescription row as-is, bypassing the service layer.
    pub async fn put_prescription(&self, prescription: Prescription) {
        self.inventory
            .lock()
            .await
            .prescriptions
            .insert(prescription.id, prescription);
    }

    /// Overwrite a purchase row as-is, bypassing the service layer.
    pub async fn put_purchase(&self, purchase: Purchase) {
        self.inventory
            .lock()
            .await
            .purchases
            .insert(purchase.id, purchase);
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, input: NewNotification) -> AppResult<Notification> {
        if self.fail_notification_writes.load(Ordering::SeqCst) {
            return Err(AppError::database("notification store unavailable"));
        }
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid notification: {e}")))?;

        let notification = input.into_notification(Uuid::now_v7(), Utc::now());
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn exists(&self, query: &DuplicateQuery) -> AppResult<bool> {
        Ok(self.notifications.iter().any(|e| query.matches(e.value())))
    }

    async fn mark_subject_read(
        &self,
        kind: NotificationType,
        subject: AlertSubject,
    ) -> AppResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for mut entry in self.notifications.iter_mut() {
            let n = entry.value_mut();
            if n.kind == kind && n.subject() == subject && n.read_at.is_none() {
                n.read_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id && entry.read_at.is_none() => {
                entry.read_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.user_id == user_id && entry.read_at.is_none() {
                entry.read_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn count_active(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .notifications
            .iter()
            .filter(|e| e.user_id == user_id && e.is_active(now))
            .count() as i64)
    }

    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let mut active: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|e| e.user_id == user_id && e.is_active(now))
            .map(|e| e.value().clone())
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active.truncate(limit.max(0) as usize);
        Ok(active)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut mine: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = mine.len() as u64;
        let items = mine
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let before = self.notifications.len();
        self.notifications
            .retain(|_, n| n.read_at.is_none_or(|read_at| read_at >= cutoff));
        Ok((before - self.notifications.len()) as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> AppResult<Vec<NotificationCount>> {
        let mut groups: HashMap<(NotificationType, _), i64> = HashMap::new();
        for entry in self.notifications.iter().filter(|e| e.created_at >= since) {
            *groups.entry((entry.kind, entry.priority)).or_default() += 1;
        }
        let mut counts: Vec<NotificationCount> = groups
            .into_iter()
            .map(|((kind, priority), count)| NotificationCount {
                kind,
                priority,
                count,
            })
            .collect();
        counts.sort_by_key(|c| (c.kind, c.priority));
        Ok(counts)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create(&self, input: NewUser) -> AppResult<User> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid user: {e}")))?;
        if self.users.iter().any(|u| u.email == input.email) {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }
        let user = User {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email,
            role: input.role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, input: NewProduct) -> AppResult<Product> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid product: {e}")))?;
        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            name: input.name,
            stock_quantity: input.stock_quantity,
            stock_threshold: input.stock_threshold,
            selling_price: input.selling_price,
            expiry_date: input.expiry_date,
            created_at: now,
            updated_at: now,
        };
        self.put_product(product.clone()).await;
        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.inventory.lock().await.products.get(&id).cloned())
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut inventory = self.inventory.lock().await;
        let stored = inventory
            .products
            .get_mut(&product.id)
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", product.id)))?;
        *stored = Product {
            updated_at: Utc::now(),
            created_at: stored.created_at,
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn list_low_stock(&self) -> AppResult<Vec<Product>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .products
            .values()
            .filter(|p| p.stock_quantity > 0 && p.stock_quantity <= p.stock_threshold)
            .cloned()
            .collect())
    }

    async fn list_out_of_stock(&self) -> AppResult<Vec<Product>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .products
            .values()
            .filter(|p| p.stock_quantity <= 0)
            .cloned()
            .collect())
    }

    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<Product>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .products
            .values()
            .filter(|p| {
                p.stock_quantity > 0
                    && p.expiry_date
                        .is_some_and(|expiry| expiry >= from && expiry <= until)
            })
            .cloned()
            .collect())
    }

    async fn list_expired_in_stock(&self, today: NaiveDate) -> AppResult<Vec<Product>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .products
            .values()
            .filter(|p| p.has_expired_stock(today))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn record_sale(&self, draft: SaleDraft) -> AppResult<RecordedSale> {
        let mut inventory = self.inventory.lock().await;
        let wanted: Vec<(Uuid, i32)> = draft
            .lines
            .iter()
            .map(|l| (l.product_id, l.quantity))
            .collect();
        inventory.ensure_stock(&wanted)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::now_v7(),
            sale_number: draft.sale_number,
            user_id: draft.user_id,
            client_name: draft.client_name,
            total_amount: draft.total_amount,
            payment_status: draft.payment_status,
            created_at: now,
        };
        let items: Vec<SaleItem> = draft
            .lines
            .iter()
            .map(|line| SaleItem {
                id: Uuid::now_v7(),
                sale_id: sale.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let products = inventory.take_stock(&wanted, now);

        inventory.sales.insert(sale.id, sale.clone());
        inventory.sale_items.extend(items.iter().cloned());
        Ok(RecordedSale {
            sale,
            items,
            products,
        })
    }

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self.inventory.lock().await.sales.get(&id).cloned())
    }

    async fn list_sale_items(&self, sale_id: Uuid) -> AppResult<Vec<SaleItem>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .sale_items
            .iter()
            .filter(|i| i.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> AppResult<Sale> {
        let mut inventory = self.inventory.lock().await;
        let sale = inventory
            .sales
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Sale {id} not found")))?;
        sale.payment_status = status;
        Ok(sale.clone())
    }
}

#[async_trait]
impl PrescriptionStore for MemoryStore {
    async fn create(&self, draft: PrescriptionDraft) -> AppResult<PrescriptionDetails> {
        let now = Utc::now();
        let prescription = Prescription {
            id: Uuid::now_v7(),
            prescription_number: draft.prescription_number,
            client_name: draft.client_name,
            doctor_name: draft.doctor_name,
            status: PrescriptionStatus::Pending,
            prescription_date: draft.prescription_date,
            expiry_date: draft.expiry_date,
            created_by: draft.created_by,
            delivered_by: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<PrescriptionItem> = draft
            .items
            .into_iter()
            .map(|(product_id, quantity, dosage)| PrescriptionItem {
                id: Uuid::now_v7(),
                prescription_id: prescription.id,
                product_id,
                quantity_prescribed: quantity,
                quantity_delivered: 0,
                dosage_instructions: dosage,
            })
            .collect();

        let mut inventory = self.inventory.lock().await;
        inventory
            .prescriptions
            .insert(prescription.id, prescription.clone());
        inventory.prescription_items.extend(items.iter().cloned());
        Ok(PrescriptionDetails {
            prescription,
            items,
        })
    }

    async fn find_details(&self, id: Uuid) -> AppResult<Option<PrescriptionDetails>> {
        Ok(self.inventory.lock().await.prescription_details(id))
    }

    async fn record_deliveries(
        &self,
        prescription_id: Uuid,
        deliveries: &[ItemDelivery],
    ) -> AppResult<(PrescriptionDetails, Vec<Product>)> {
        let mut inventory = self.inventory.lock().await;

        let mut wanted = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let item = inventory
                .prescription_items
                .iter()
                .find(|i| i.id == delivery.item_id && i.prescription_id == prescription_id)
                .ok_or_else(|| {
                    AppError::not_found(format!("Prescription item {} not found", delivery.item_id))
                })?;
            if delivery.quantity > item.remaining_quantity() {
                return Err(AppError::conflict(format!(
                    "Delivery of {} exceeds the remaining quantity of item {}",
                    delivery.quantity, delivery.item_id
                )));
            }
            wanted.push((item.product_id, delivery.quantity));
        }
        inventory.ensure_stock(&wanted)?;

        for delivery in deliveries {
            if let Some(item) = inventory
                .prescription_items
                .iter_mut()
                .find(|i| i.id == delivery.item_id)
            {
                item.quantity_delivered += delivery.quantity;
            }
        }
        let products = inventory.take_stock(&wanted, Utc::now());
        let details = inventory
            .prescription_details(prescription_id)
            .ok_or_else(|| AppError::not_found(format!("Prescription {prescription_id} not found")))?;
        Ok((details, products))
    }

    async fn save(&self, prescription: &Prescription) -> AppResult<Prescription> {
        let mut inventory = self.inventory.lock().await;
        let stored = inventory
            .prescriptions
            .get_mut(&prescription.id)
            .ok_or_else(|| {
                AppError::not_found(format!("Prescription {} not found", prescription.id))
            })?;
        stored.status = prescription.status;
        stored.delivered_by = prescription.delivered_by;
        stored.delivered_at = prescription.delivered_at;
        stored.updated_at = prescription.updated_at;
        Ok(stored.clone())
    }

    async fn list_expiring_pending(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<PrescriptionDetails>> {
        let inventory = self.inventory.lock().await;
        let mut due: Vec<&Prescription> = inventory
            .prescriptions
            .values()
            .filter(|p| p.status == PrescriptionStatus::Pending)
            .filter(|p| (from..=until).contains(&p.expiry_date))
            .collect();
        due.sort_by_key(|p| (p.expiry_date, p.id));
        Ok(due
            .into_iter()
            .filter_map(|p| inventory.prescription_details(p.id))
            .collect())
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn create(&self, draft: PurchaseDraft) -> AppResult<Purchase> {
        draft
            .input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid purchase: {e}")))?;
        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::now_v7(),
            purchase_number: draft.purchase_number,
            supplier_name: draft.input.supplier_name,
            status: PurchaseStatus::Pending,
            order_date: draft.input.order_date,
            expected_date: draft.input.expected_date,
            received_date: None,
            total_amount: draft.input.total_amount,
            total_items: draft.input.total_items,
            received_items: 0,
            created_by: draft.created_by,
            received_by: None,
            created_at: now,
            updated_at: now,
        };
        self.put_purchase(purchase.clone()).await;
        Ok(purchase)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        Ok(self.inventory.lock().await.purchases.get(&id).cloned())
    }

    async fn save(&self, purchase: &Purchase) -> AppResult<Purchase> {
        let mut inventory = self.inventory.lock().await;
        let stored = inventory
            .purchases
            .get_mut(&purchase.id)
            .ok_or_else(|| AppError::not_found(format!("Purchase {} not found", purchase.id)))?;
        stored.status = purchase.status;
        stored.received_date = purchase.received_date;
        stored.received_items = purchase.received_items;
        stored.received_by = purchase.received_by;
        stored.updated_at = purchase.updated_at;
        Ok(stored.clone())
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Purchase>> {
        let inventory = self.inventory.lock().await;
        Ok(inventory
            .purchases
            .values()
            .filter(|p| p.is_overdue(today))
            .cloned()
            .collect())
    }
}
