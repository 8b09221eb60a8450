//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (DB ping)
//!
//! # Auth
//! POST /api/auth/register              - Create an account
//! POST /api/auth/login                 - Login, returns a bearer token
//! POST /api/auth/verify-email          - Verify email with token
//! POST /api/auth/resend-verification   - Resend the verification email
//! GET  /api/auth/profile               - Current profile (auth)
//! PUT  /api/auth/profile               - Update profile (auth)
//! POST /api/auth/change-password       - Change password (auth)
//! POST /api/auth/refresh               - Issue a fresh token (auth)
//!
//! # Catalog
//! GET  /api/products                   - Product listing (filters, pagination)
//! GET  /api/products/categories        - Category tree
//! GET  /api/products/categories/{id}/products - Products in a category
//! GET  /api/products/{id}              - Product detail
//! GET  /api/products/{id}/reviews      - Reviews + statistics
//! POST /api/products/{id}/reviews      - Create a review (auth)
//!
//! # Cart (all auth)
//! GET    /api/cart                     - Cart with totals
//! POST   /api/cart/items               - Add an item
//! PUT    /api/cart/items/{id}          - Update quantity
//! DELETE /api/cart/items/{id}          - Remove an item
//! DELETE /api/cart/clear               - Empty the cart
//! GET    /api/cart/count               - Line count badge
//!
//! # Orders (all auth)
//! GET    /api/orders                   - Order history
//! POST   /api/orders                   - Place an order from the cart
//! GET    /api/orders/{id}              - Order detail
//! POST   /api/orders/{id}/cancel       - Cancel (pending/processing only)
//! GET    /api/orders/{id}/status       - Status + history
//! GET    /api/orders/addresses         - Address list
//! POST   /api/orders/addresses         - Create address
//! PUT    /api/orders/addresses/{id}    - Update address
//! DELETE /api/orders/addresses/{id}    - Delete address (if unreferenced)
//!
//! # Wishlist (all auth)
//! GET    /api/wishlist                 - Wishlist
//! POST   /api/wishlist                 - Add a product
//! DELETE /api/wishlist/{product_id}    - Remove a product
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Pagination envelope shared by all list endpoints.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Build the envelope for a page of `total` matches.
    #[must_use]
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

/// Common page/per_page query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Clamp to sane bounds: page >= 1, per_page in [1, max].
    #[must_use]
    pub fn clamp(&self, default_per_page: i64, max_per_page: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, max_per_page);
        (page, per_page)
    }

    /// SQL offset for the clamped page.
    #[must_use]
    pub const fn offset(page: i64, per_page: i64) -> i64 {
        (page - 1) * per_page
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route("/change-password", post(auth::change_password))
        .route("/refresh", post(auth::refresh))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route(
            "/categories/{id}/products",
            get(products::category_products),
        )
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/clear", delete(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the order routes router (addresses are a sub-resource).
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/addresses",
            get(orders::addresses).post(orders::create_address),
        )
        .route(
            "/addresses/{id}",
            put(orders::update_address).delete(orders::delete_address),
        )
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/status", get(orders::status))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::add))
        .route("/{product_id}", delete(wishlist::remove))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/wishlist", wishlist_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_envelope() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);

        let first = Pagination::new(1, 10, 35);
        assert!(!first.has_prev);

        let last = Pagination::new(4, 10, 35);
        assert!(!last.has_next);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(500),
        };
        let (page, per_page) = params.clamp(20, 100);
        assert_eq!(page, 1);
        assert_eq!(per_page, 100);

        let defaults = PageParams {
            page: None,
            per_page: None,
        };
        assert_eq!(defaults.clamp(20, 100), (1, 20));
    }
}
