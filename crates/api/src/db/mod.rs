//! Database operations for the AVOI `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Accounts, credentials, email verification state
//! - `addresses` - Shipping/billing addresses
//! - `categories`, `products`, `product_images`, `product_variants` - Catalog
//! - `inventory`, `inventory_movements` - Stock (single source of truth)
//! - `cart_items` - Per-user staging area for checkout
//! - `orders`, `order_items`, `order_status_history`, `payments` - Orders
//! - `reviews`, `wishlist_items`
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are applied via:
//! ```bash
//! cargo run -p avoi-cli -- migrate
//! ```
//!
//! Queries are runtime-checked (`query_as`/`query`) rather than macro
//! verified, so the workspace builds without a live `DATABASE_URL`.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod reviews;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use inventory::InventoryRepository;
pub use orders::OrderRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, duplicate review).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into [`Self::Conflict`].
    pub(crate) fn from_sqlx(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
