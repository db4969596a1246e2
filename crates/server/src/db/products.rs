//! Mod catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use moostyle_core::ProductId;

use super::RepositoryError;
use crate::models::user::Product;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    handle: String,
    title: String,
    category: String,
    price: Decimal,
    is_published: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            handle: row.handle,
            title: row.title,
            category: row.category,
            price: row.price,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, handle, title, category, price, is_published, created_at \
             FROM products WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List published products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, handle, title, category, price, is_published, created_at \
             FROM products WHERE is_published ORDER BY created_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Insert a product into the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the handle already exists.
    pub async fn create(
        &self,
        handle: &str,
        title: &str,
        category: &str,
        price: Decimal,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (handle, title, category, price) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, handle, title, category, price, is_published, created_at",
        )
        .bind(handle)
        .bind(title)
        .bind(category)
        .bind(price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("handle already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(Product::from(row))
    }
}
