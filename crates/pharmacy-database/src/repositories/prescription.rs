//! PostgreSQL prescription repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use pharmacy_core::error::{AppError, ErrorKind};
use pharmacy_core::result::AppResult;
use pharmacy_entity::prescription::{
    ItemDelivery, Prescription, PrescriptionDetails, PrescriptionItem,
};
use pharmacy_entity::product::Product;

use super::sale::{latest_per_product, take_stock};
use crate::store::{PrescriptionDraft, PrescriptionStore};

#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: PgPool,
}

impl PrescriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_of(&self, prescription_id: Uuid) -> AppResult<Vec<PrescriptionItem>> {
        sqlx::query_as::<_, PrescriptionItem>(
            "SELECT * FROM prescription_items WHERE prescription_id = $1 ORDER BY id",
        )
        .bind(prescription_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list prescription items", e)
        })
    }
}

#[async_trait]
impl PrescriptionStore for PrescriptionRepository {
    async fn create(&self, draft: PrescriptionDraft) -> AppResult<PrescriptionDetails> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        let prescription = sqlx::query_as::<_, Prescription>(
            "INSERT INTO prescriptions (id, prescription_number, client_name, doctor_name, \
             prescription_date, expiry_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&draft.prescription_number)
        .bind(&draft.client_name)
        .bind(&draft.doctor_name)
        .bind(draft.prescription_date)
        .bind(draft.expiry_date)
        .bind(draft.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert prescription", e))?;

        let mut items = Vec::with_capacity(draft.items.len());
        for (product_id, quantity, dosage) in &draft.items {
            let item = sqlx::query_as::<_, PrescriptionItem>(
                "INSERT INTO prescription_items (id, prescription_id, product_id, \
                 quantity_prescribed, dosage_instructions) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(prescription.id)
            .bind(product_id)
            .bind(quantity)
            .bind(dosage)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert prescription item", e)
            })?;
            items.push(item);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit prescription", e)
        })?;

        Ok(PrescriptionDetails {
            prescription,
            items,
        })
    }

    async fn find_details(&self, id: Uuid) -> AppResult<Option<PrescriptionDetails>> {
        let prescription =
            sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find prescription", e)
                })?;

        match prescription {
            Some(prescription) => {
                let items = self.items_of(id).await?;
                Ok(Some(PrescriptionDetails {
                    prescription,
                    items,
                }))
            }
            None => Ok(None),
        }
    }

    async fn record_deliveries(
        &self,
        prescription_id: Uuid,
        deliveries: &[ItemDelivery],
    ) -> AppResult<(PrescriptionDetails, Vec<Product>)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        let mut products = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let item = sqlx::query_as::<_, PrescriptionItem>(
                "UPDATE prescription_items SET quantity_delivered = quantity_delivered + $3 \
                 WHERE id = $1 AND prescription_id = $2 \
                 AND quantity_delivered + $3 <= quantity_prescribed RETURNING *",
            )
            .bind(delivery.item_id)
            .bind(prescription_id)
            .bind(delivery.quantity)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record delivery", e))?
            .ok_or_else(|| {
                AppError::conflict(format!(
                    "Delivery of {} exceeds the remaining quantity of item {}",
                    delivery.quantity, delivery.item_id
                ))
            })?;
            products.push(take_stock(&mut tx, item.product_id, delivery.quantity).await?);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit delivery", e))?;

        let details = self
            .find_details(prescription_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prescription {prescription_id} not found")))?;
        Ok((details, latest_per_product(products)))
    }

    async fn save(&self, prescription: &Prescription) -> AppResult<Prescription> {
        sqlx::query_as::<_, Prescription>(
            "UPDATE prescriptions SET status = $2, delivered_by = $3, delivered_at = $4, \
             updated_at = $5 WHERE id = $1 RETURNING *",
        )
        .bind(prescription.id)
        .bind(prescription.status)
        .bind(prescription.delivered_by)
        .bind(prescription.delivered_at)
        .bind(prescription.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save prescription", e))?
        .ok_or_else(|| AppError::not_found(format!("Prescription {} not found", prescription.id)))
    }

    async fn list_expiring_pending(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<PrescriptionDetails>> {
        let prescriptions = sqlx::query_as::<_, Prescription>(
            "SELECT * FROM prescriptions WHERE status = 'pending' \
             AND expiry_date BETWEEN $1 AND $2 ORDER BY expiry_date, id",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list expiring prescriptions", e)
        })?;

        let mut details = Vec::with_capacity(prescriptions.len());
        for prescription in prescriptions {
            let items = self.items_of(prescription.id).await?;
            details.push(PrescriptionDetails {
                prescription,
                items,
            });
        }
        Ok(details)
    }
}
