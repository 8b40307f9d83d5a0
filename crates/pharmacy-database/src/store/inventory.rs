//! Persistence contracts for the business entities alerts are raised on.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use pharmacy_core::result::AppResult;
use pharmacy_entity::prescription::{ItemDelivery, Prescription, PrescriptionDetails};
use pharmacy_entity::product::{NewProduct, Product};
use pharmacy_entity::purchase::{NewPurchase, Purchase};
use pharmacy_entity::sale::{PaymentStatus, Sale, SaleItem};

#[async_trait]
pub trait ProductStore: Send + Sync + Debug + 'static {
    async fn create(&self, input: NewProduct) -> AppResult<Product>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Persist every mutable field of `product` and bump `updated_at`.
    async fn update(&self, product: &Product) -> AppResult<Product>;

    /// Products with `0 < stock <= threshold`.
    async fn list_low_stock(&self) -> AppResult<Vec<Product>>;

    /// Products with `stock <= 0`.
    async fn list_out_of_stock(&self) -> AppResult<Vec<Product>>;

    /// In-stock products whose expiry date lies in `[from, until]`.
    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<Product>>;

    /// In-stock products whose expiry date is before `today`.
    async fn list_expired_in_stock(&self, today: NaiveDate) -> AppResult<Vec<Product>>;
}

/// One validated sale line, priced.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A sale ready to be written.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub sale_number: String,
    pub user_id: Uuid,
    pub client_name: Option<String>,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub lines: Vec<SaleLine>,
}

/// Result of writing a sale: the rows plus the products after their stock
/// was decremented.
#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub products: Vec<Product>,
}

#[async_trait]
pub trait SaleStore: Send + Sync + Debug + 'static {
    /// Insert the sale and its lines and decrement stock atomically.
    ///
    /// Fails with a conflict, writing nothing, if any product lacks stock.
    async fn record_sale(&self, draft: SaleDraft) -> AppResult<RecordedSale>;

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<Sale>>;

    async fn list_sale_items(&self, sale_id: Uuid) -> AppResult<Vec<SaleItem>>;

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> AppResult<Sale>;
}

/// A prescription ready to be written.
#[derive(Debug, Clone)]
pub struct PrescriptionDraft {
    pub prescription_number: String,
    pub client_name: String,
    pub doctor_name: String,
    pub prescription_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub created_by: Uuid,
    /// `(product_id, quantity_prescribed, dosage_instructions)`
    pub items: Vec<(Uuid, i32, Option<String>)>,
}

#[async_trait]
pub trait PrescriptionStore: Send + Sync + Debug + 'static {
    async fn create(&self, draft: PrescriptionDraft) -> AppResult<PrescriptionDetails>;

    async fn find_details(&self, id: Uuid) -> AppResult<Option<PrescriptionDetails>>;

    /// Add delivered quantities and decrement product stock atomically.
    ///
    /// Returns the refreshed prescription and the products after the
    /// decrement. Fails with a conflict, writing nothing, if stock is short.
    async fn record_deliveries(
        &self,
        prescription_id: Uuid,
        deliveries: &[ItemDelivery],
    ) -> AppResult<(PrescriptionDetails, Vec<Product>)>;

    /// Persist status and delivery stamps.
    async fn save(&self, prescription: &Prescription) -> AppResult<Prescription>;

    /// Pending prescriptions whose expiry date falls in `from..=until`,
    /// soonest first.
    async fn list_expiring_pending(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<PrescriptionDetails>>;
}

/// A purchase order ready to be written.
#[derive(Debug, Clone)]
pub struct PurchaseDraft {
    pub purchase_number: String,
    pub created_by: Uuid,
    pub input: NewPurchase,
}

#[async_trait]
pub trait PurchaseStore: Send + Sync + Debug + 'static {
    async fn create(&self, draft: PurchaseDraft) -> AppResult<Purchase>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>>;

    /// Persist status, receipt fields and `updated_at`.
    async fn save(&self, purchase: &Purchase) -> AppResult<Purchase>;

    /// Pending orders whose expected date is before `today`.
    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Purchase>>;
}
