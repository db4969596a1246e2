//! Cart repository.
//!
//! Each user owns at most one cart (enforced by a unique constraint); every
//! accessor works in terms of the owning user rather than a raw cart ID.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use moostyle_core::{CartId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    handle: String,
    title: String,
    quantity: i32,
    unit_price: Decimal,
    added_at: DateTime<Utc>,
}

impl CartItemRow {
    fn into_domain(self) -> Result<CartItem, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity: {}", self.quantity))
        })?;

        Ok(CartItem {
            product_id: ProductId::new(self.product_id),
            handle: self.handle,
            title: self.title,
            quantity,
            unit_price: self.unit_price,
            added_at: self.added_at,
        })
    }
}

/// Upper bound on a single cart line's quantity. Writes clamp at this value
/// so repeated increments can never overflow the INTEGER column.
pub const MAX_LINE_QUANTITY: u32 = 999;

#[allow(clippy::cast_possible_wrap)] // capped at MAX_LINE_QUANTITY
const fn quantity_param(quantity: u32) -> i32 {
    if quantity > MAX_LINE_QUANTITY {
        MAX_LINE_QUANTITY as i32
    } else {
        quantity as i32
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the user's cart, creating an empty one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id, user_id, created_at, updated_at",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        let items = self.items_for(row.id).await?;

        Ok(Cart {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn items_for(&self, cart_id: i32) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.product_id, p.handle, p.title, ci.quantity, \
                    p.price AS unit_price, ci.added_at \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 \
             ORDER BY ci.added_at ASC",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartItemRow::into_domain).collect()
    }

    /// Add a product to the user's cart; adding an existing product
    /// increments its quantity, capped at [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        sqlx::query(&format!(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) \
             DO UPDATE SET quantity = \
                 LEAST(cart_items.quantity + EXCLUDED.quantity, {MAX_LINE_QUANTITY})"
        ))
        .bind(cart.id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity_param(quantity))
        .execute(self.pool)
        .await?;

        self.touch(cart.id).await?;
        self.get_or_create(user_id).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart.id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity_param(quantity))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.touch(cart.id).await?;
        self.get_or_create(user_id).await
    }

    /// Remove a product from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart.id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.touch(cart.id).await?;
        self.get_or_create(user_id).await
    }

    /// Remove every line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_i32())
            .execute(self.pool)
            .await?;

        self.touch(cart.id).await?;
        self.get_or_create(user_id).await
    }

    /// List every cart that currently has items (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(&self) -> Result<Vec<Cart>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT DISTINCT c.id, c.user_id, c.created_at, c.updated_at \
             FROM carts c \
             JOIN cart_items ci ON ci.cart_id = c.id \
             ORDER BY c.updated_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        let mut carts = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            carts.push(Cart {
                id: CartId::new(row.id),
                user_id: UserId::new(row.user_id),
                items,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        Ok(carts)
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_param_is_clamped() {
        assert_eq!(quantity_param(1), 1);
        assert_eq!(quantity_param(MAX_LINE_QUANTITY), 999);
        assert_eq!(quantity_param(MAX_LINE_QUANTITY + 1), 999);
        assert_eq!(quantity_param(u32::MAX), 999);
    }
}
