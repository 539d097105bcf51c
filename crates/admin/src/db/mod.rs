//! Database operations for the shared Liher `PostgreSQL` database.
//!
//! Both servers point at the same database; the back-office touches the
//! management side of the same tables the storefront sells from:
//!
//! ## Tables
//!
//! - `usuarios` / `permisos_usuarios_admin` - Accounts and per-section flags
//! - `producto` / `variante_producto` - Catalog items and their variants
//! - `categoria` / `color` / `talla` - Catalog lookups
//! - `entrada_inventario` - Received stock entries
//! - `pedidos` / `item_pedido` - Orders written by the storefront
//! - `peticiones_producto` - Out-of-stock product requests
//!
//! # Migrations
//!
//! The schema is owned by the storefront crate's `migrations/` directory
//! and applied via `cargo run -p liher-cli -- migrate`; this crate never
//! migrates on its own.

pub mod lookups;
pub mod orders;
pub mod permissions;
pub mod products;
pub mod requests;
pub mod stock;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use lookups::LookupRepository;
pub use orders::OrderRepository;
pub use permissions::PermissionRepository;
pub use products::ProductRepository;
pub use requests::RequestRepository;
pub use stock::StockRepository;
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

    /// Constraint violation (duplicate value, or a row still referenced).
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

    /// Map a sqlx error to `Conflict` when a foreign key blocks a delete.
    pub(crate) fn from_sqlx_referenced(e: sqlx::Error, conflict_msg: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(conflict_msg.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
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
