//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                            - Liveness
//! GET    /health/ready                      - Readiness (DB ping)
//!
//! # Catalog
//! GET    /api/products                      - Published mods
//! GET    /api/products/{id}                 - Mod detail
//!
//! # Auth (strict rate limit)
//! POST   /api/auth/register                 - Create account + send OTP
//! POST   /api/auth/verify-email             - Consume OTP
//! POST   /api/auth/resend-code              - Re-issue OTP
//! POST   /api/auth/login                    - Start session
//! POST   /api/auth/logout                   - End session
//! GET    /api/auth/me                       - Current user
//!
//! # Cart (requires auth)
//! GET    /api/cart                          - Show cart
//! DELETE /api/cart                          - Clear cart
//! POST   /api/cart/items                    - Add item
//! PATCH  /api/cart/items/{product_id}       - Set quantity
//! DELETE /api/cart/items/{product_id}       - Remove item
//! POST   /api/cart/download                 - Atomic download + point award
//!
//! # Account (requires auth)
//! GET    /api/user/points                   - Point balance + tier
//! GET    /api/user/transactions             - Point history
//! PATCH  /api/user/profile                  - Update profile
//!
//! # Admin (requires admin role)
//! GET    /api/admin/users                   - List users
//! PATCH  /api/admin/users/{id}              - Role / active / ban
//! GET    /api/admin/users/{id}/transactions - A user's point history
//! DELETE /api/admin/users/{id}/cart         - Clear a user's cart
//! GET    /api/admin/carts                   - Non-empty carts
//! GET    /api/admin/stats                   - Aggregate store numbers
//! GET    /api/admin/security/events         - Security log tail
//! GET    /api/admin/security/metrics        - Request metrics
//! GET    /api/admin/recovery                - Incident runbooks
//! POST   /api/admin/recovery/{slug}/drill   - Run a simulated drill
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod products;
pub mod user;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router (strict rate limit).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-code", post(auth::resend_code))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/download", post(cart::download))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/points", get(user::points))
        .route("/transactions", get(user::transactions))
        .route("/profile", patch(user::update_profile))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", patch(admin::update_user))
        .route("/users/{id}/transactions", get(admin::user_transactions))
        .route("/users/{id}/cart", delete(admin::clear_user_cart))
        .route("/carts", get(admin::list_carts))
        .route("/stats", get(admin::stats))
        .route("/security/events", get(admin::security_events))
        .route("/security/metrics", get(admin::security_metrics))
        .route("/recovery", get(admin::list_runbooks))
        .route("/recovery/{slug}/drill", post(admin::run_drill))
}

/// Create all routes for the API server.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .merge(
            Router::new()
                .nest("/products", product_routes())
                .nest("/cart", cart_routes())
                .nest("/user", user_routes())
                .nest("/admin", admin_routes())
                .layer(api_rate_limiter()),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
}
