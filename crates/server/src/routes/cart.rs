//! Cart routes, including the point-awarding download flow.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use moostyle_core::ProductId;

use crate::db::carts::{CartRepository, MAX_LINE_QUANTITY};
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, client_ip_from_headers};
use crate::models::cart::Cart;
use crate::models::transaction::PointTransaction;
use crate::response::ApiResponse;
use crate::services::rewards::RewardsService;
use crate::state::AppState;

/// Cart as returned to the client, with computed totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<crate::models::cart::CartItem>,
    pub total_items: u32,
    pub total_price: Decimal,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total_items = cart.total_items();
        let total_price = cart.total_price();
        Self {
            items: cart.items,
            total_items,
            total_price,
        }
    }
}

/// GET /api/cart
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<CartView>> {
    let cart = CartRepository::new(state.pool()).get_or_create(user.id).await?;
    Ok(ApiResponse::ok("Cart", cart.into()))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "Quantity cannot exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// POST /api/cart/items
///
/// Adding a product already in the cart increments its quantity.
///
/// # Errors
///
/// Returns 404 for an unknown or unpublished product, 400 for a zero or
/// oversized quantity.
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<AddItemRequest>,
) -> Result<ApiResponse<CartView>> {
    validate_quantity(payload.quantity)?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(payload.product_id)
        .await?
        .filter(|p| p.is_published)
        .ok_or_else(|| AppError::NotFound(format!("product {}", payload.product_id)))?;

    let cart = CartRepository::new(state.pool())
        .add_item(user.id, product.id, payload.quantity)
        .await?;

    Ok(ApiResponse::ok("Added to cart", cart.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// PATCH /api/cart/items/{product_id}
///
/// # Errors
///
/// Returns 404 if the product is not in the cart, 400 for a zero or
/// oversized quantity.
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<ApiResponse<CartView>> {
    validate_quantity(payload.quantity)?;

    let cart = CartRepository::new(state.pool())
        .update_item(user.id, product_id, payload.quantity)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("product {product_id} in cart"))
            }
            other => AppError::Database(other),
        })?;

    Ok(ApiResponse::ok("Cart updated", cart.into()))
}

/// DELETE /api/cart/items/{product_id}
///
/// # Errors
///
/// Returns 404 if the product is not in the cart.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<ApiResponse<CartView>> {
    let cart = CartRepository::new(state.pool())
        .remove_item(user.id, product_id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("product {product_id} in cart"))
            }
            other => AppError::Database(other),
        })?;

    Ok(ApiResponse::ok("Removed from cart", cart.into()))
}

/// DELETE /api/cart
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<CartView>> {
    let cart = CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(ApiResponse::ok("Cart cleared", cart.into()))
}

/// Receipt returned by a successful download.
#[derive(Debug, Serialize)]
pub struct DownloadReceipt {
    pub transaction: PointTransaction,
    pub level_up: bool,
}

/// POST /api/cart/download
///
/// Awards points, stamps the cooldown, appends the audit transaction, and
/// clears the cart, all atomically.
///
/// # Errors
///
/// Returns 429 inside the 5-minute cooldown, 400 for an empty or oversized
/// cart.
pub async fn download(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
) -> Result<ApiResponse<DownloadReceipt>> {
    let ip = client_ip_from_headers(&headers);
    let transaction = RewardsService::new(state.pool())
        .download_cart(user.id, &ip)
        .await?;

    let level_up = transaction.is_level_up();
    let message = if level_up {
        format!(
            "Download ready! You earned {} points and reached {}",
            transaction.points_awarded, transaction.level_after
        )
    } else {
        format!("Download ready! You earned {} points", transaction.points_awarded)
    };

    Ok(ApiResponse::ok(
        message,
        DownloadReceipt {
            transaction,
            level_up,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(AppError::BadRequest(_))
        ));
    }
}
