//! Public catalog routes.

use axum::extract::{Path, State};

use moostyle_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::user::Product;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/products
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_published().await?;
    Ok(ApiResponse::ok("Products", products))
}

/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 for an unknown or unpublished product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|p| p.is_published)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ApiResponse::ok("Product", product))
}
