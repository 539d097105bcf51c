//! Database migration command.
//!
//! Both servers share one `PostgreSQL` schema; the migration files live in
//! `crates/storefront/migrations/` and are embedded into this binary at
//! compile time, so the CLI can migrate any environment it can reach.
//!
//! # Usage
//!
//! ```bash
//! liher-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use super::{CommandError, connect};

/// Apply the shared schema migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the connection fails,
/// or a migration cannot be applied.
pub async fn apply() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect().await?;

    tracing::info!("Applying migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
