//! PostgreSQL sale repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use pharmacy_core::error::{AppError, ErrorKind};
use pharmacy_core::result::AppResult;
use pharmacy_entity::product::Product;
use pharmacy_entity::sale::{PaymentStatus, Sale, SaleItem};

use crate::store::{RecordedSale, SaleDraft, SaleStore};

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Decrement stock inside `tx`, refusing to go below zero.
pub(crate) async fn take_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(
        "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = NOW() \
         WHERE id = $1 AND stock_quantity >= $2 RETURNING *",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to decrement stock", e))?
    .ok_or_else(|| {
        AppError::conflict(format!(
            "Insufficient stock for product {product_id} (requested {quantity})"
        ))
    })
}

/// Keep only the latest state of each product, in first-seen order.
pub(crate) fn latest_per_product(products: Vec<Product>) -> Vec<Product> {
    let mut latest: Vec<Product> = Vec::with_capacity(products.len());
    for product in products {
        match latest.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product,
            None => latest.push(product),
        }
    }
    latest
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn record_sale(&self, draft: SaleDraft) -> AppResult<RecordedSale> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        let sale = sqlx::query_as::<_, Sale>(
            "INSERT INTO sales (id, sale_number, user_id, client_name, total_amount, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&draft.sale_number)
        .bind(draft.user_id)
        .bind(&draft.client_name)
        .bind(draft.total_amount)
        .bind(draft.payment_status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert sale", e))?;

        let mut items = Vec::with_capacity(draft.lines.len());
        let mut products = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let item = sqlx::query_as::<_, SaleItem>(
                "INSERT INTO sale_items (id, sale_id, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(sale.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert sale item", e))?;
            items.push(item);
            products.push(take_stock(&mut tx, line.product_id, line.quantity).await?);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit sale", e))?;

        Ok(RecordedSale {
            sale,
            items,
            products: latest_per_product(products),
        })
    }

    async fn find_sale(&self, id: Uuid) -> AppResult<Option<Sale>> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sale", e))
    }

    async fn list_sale_items(&self, sale_id: Uuid) -> AppResult<Vec<SaleItem>> {
        sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY id")
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sale items", e))
    }

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> AppResult<Sale> {
        sqlx::query_as::<_, Sale>("UPDATE sales SET payment_status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update sale", e))?
            .ok_or_else(|| AppError::not_found(format!("Sale {id} not found")))
    }
}
