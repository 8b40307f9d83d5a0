//! PostgreSQL purchase order repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::{AppError, ErrorKind};
use pharmacy_core::result::AppResult;
use pharmacy_entity::purchase::Purchase;

use crate::store::{PurchaseDraft, PurchaseStore};

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseStore for PurchaseRepository {
    async fn create(&self, draft: PurchaseDraft) -> AppResult<Purchase> {
        draft
            .input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid purchase: {e}")))?;

        sqlx::query_as::<_, Purchase>(
            "INSERT INTO purchases (id, purchase_number, supplier_name, order_date, expected_date, \
             total_amount, total_items, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&draft.purchase_number)
        .bind(&draft.input.supplier_name)
        .bind(draft.input.order_date)
        .bind(draft.input.expected_date)
        .bind(draft.input.total_amount)
        .bind(draft.input.total_items)
        .bind(draft.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create purchase", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find purchase", e))
    }

    async fn save(&self, purchase: &Purchase) -> AppResult<Purchase> {
        sqlx::query_as::<_, Purchase>(
            "UPDATE purchases SET status = $2, received_date = $3, received_items = $4, \
             received_by = $5, updated_at = $6 WHERE id = $1 RETURNING *",
        )
        .bind(purchase.id)
        .bind(purchase.status)
        .bind(purchase.received_date)
        .bind(purchase.received_items)
        .bind(purchase.received_by)
        .bind(purchase.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save purchase", e))?
        .ok_or_else(|| AppError::not_found(format!("Purchase {} not found", purchase.id)))
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Purchase>> {
        sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE status = 'pending' AND expected_date < $1 \
             ORDER BY expected_date",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list overdue purchases", e))
    }
}
