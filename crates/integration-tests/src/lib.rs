//! Integration tests for Liher Fashion.
//!
//! The tests in `tests/` drive the real servers over HTTP, so they are all
//! marked `#[ignore]` and skipped by a plain `cargo test`.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and prepare the schema
//! cargo run -p liher-cli -- migrate
//! cargo run -p liher-cli -- seed
//!
//! # Start both servers
//! cargo run -p liher-storefront   # port 3000
//! cargo run -p liher-admin        # port 3001
//!
//! # Run the ignored tests
//! cargo test -p liher-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_pages` - Public page rendering and auth gating
//! - `storefront_cart` - Cart and petición JSON endpoints
//! - `admin_panel` - Staff login and section gating
//! - `shared_schema` - Both servers agree on one database schema

use reqwest::Client;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client with a cookie store, so session cookies survive across
/// requests the way a browser keeps them.
///
/// Redirects are NOT followed: most flows under test answer with a
/// `303 See Other` plus a flash message in the `Location` query string,
/// and following it would hide the part being asserted.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the test database using `DATABASE_URL`.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is missing or the connection fails.
pub async fn test_pool() -> sqlx::PgPool {
    use secrecy::{ExposeSecret, SecretString};

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .expect("DATABASE_URL must be set for database-backed tests");

    sqlx::PgPool::connect(database_url.expose_secret())
        .await
        .expect("Failed to connect to test database")
}
