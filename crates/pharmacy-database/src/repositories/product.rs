//! PostgreSQL product repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use pharmacy_core::error::{AppError, ErrorKind};
use pharmacy_core::result::AppResult;
use pharmacy_entity::product::{NewProduct, Product};

use crate::store::ProductStore;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list(&self, sql: &str, what: &str) -> AppResult<Vec<Product>> {
        sqlx::query_as::<_, Product>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to list {what}"), e))
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn create(&self, input: NewProduct) -> AppResult<Product> {
        input
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid product: {e}")))?;

        sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, stock_quantity, stock_threshold, selling_price, expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(input.stock_quantity)
        .bind(input.stock_threshold)
        .bind(input.selling_price)
        .bind(input.expiry_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create product", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find product", e))
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, stock_quantity = $3, stock_threshold = $4, \
             selling_price = $5, expiry_date = $6, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.stock_quantity)
        .bind(product.stock_threshold)
        .bind(product.selling_price)
        .bind(product.expiry_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update product", e))?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", product.id)))
    }

    async fn list_low_stock(&self) -> AppResult<Vec<Product>> {
        self.list(
            "SELECT * FROM products WHERE stock_quantity > 0 AND stock_quantity <= stock_threshold \
             ORDER BY stock_quantity",
            "low-stock products",
        )
        .await
    }

    async fn list_out_of_stock(&self) -> AppResult<Vec<Product>> {
        self.list(
            "SELECT * FROM products WHERE stock_quantity <= 0 ORDER BY name",
            "out-of-stock products",
        )
        .await
    }

    async fn list_expiring_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<Product>> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity > 0 \
             AND expiry_date >= $1 AND expiry_date <= $2 ORDER BY expiry_date",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list expiring products", e))
    }

    async fn list_expired_in_stock(&self, today: NaiveDate) -> AppResult<Vec<Product>> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity > 0 AND expiry_date < $1 \
             ORDER BY expiry_date",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list expired products", e))
    }
}
