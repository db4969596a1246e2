//! Cart domain types.
//!
//! Totals are always recomputed from the line items, never stored
//! denormalized, so `total_items` can never drift from the rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use moostyle_core::{CartId, ProductId, UserId};

/// A line in a user's cart, joined with catalog detail.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub handle: String,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Price of this line (quantity x unit price).
    #[must_use]
    pub fn line_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A user's cart with its items.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Sum of the item quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of the line prices.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_price).sum()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product: i32, quantity: u32, cents: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(product),
            handle: format!("mod-{product}"),
            title: format!("Mod {product}"),
            quantity,
            unit_price: Decimal::new(cents, 2),
            added_at: Utc::now(),
        }
    }

    fn cart(items: Vec<CartItem>) -> Cart {
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            items,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_empty_cart() {
        let cart = cart(vec![]);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_total_items_is_quantity_sum() {
        let cart = cart(vec![item(1, 2, 499), item(2, 3, 999)]);
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_total_price_is_line_sum() {
        let cart = cart(vec![item(1, 2, 499), item(2, 1, 1000)]);
        // 2 x 4.99 + 1 x 10.00 = 19.98
        assert_eq!(cart.total_price(), Decimal::new(1998, 2));
    }

    #[test]
    fn test_line_price() {
        assert_eq!(item(1, 4, 250).line_price(), Decimal::new(1000, 2));
    }
}
