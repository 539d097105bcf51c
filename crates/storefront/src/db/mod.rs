//! Database operations for the shared Liher `PostgreSQL` database.
//!
//! Both servers point at the same database; the storefront touches the
//! customer-facing tables:
//!
//! ## Tables
//!
//! - `usuarios` - Customer and staff accounts (staff log in on the admin server)
//! - `sessions` - Tower-sessions storage
//! - `categoria` / `color` / `talla` - Catalog lookups
//! - `producto` / `variante_producto` - Catalog items and their size/color variants
//! - `carrito` / `item_carrito` - Shopping carts
//! - `identificacion` / `envio` - Checkout identification and shipping addresses
//! - `pedidos` / `item_pedido` - Orders written when a payment is approved
//! - `peticiones_producto` - Out-of-stock product requests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p liher-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod requests;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use checkout::CheckoutRepository;
pub use requests::ProductRequestRepository;
pub use users::UserRepository;

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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error to `Conflict` when it is a unique violation.
    pub(crate) fn from_sqlx(e: sqlx::Error, conflict_msg: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_msg.to_owned());
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
