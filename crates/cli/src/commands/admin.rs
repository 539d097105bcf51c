//! Staff account management commands.
//!
//! # Usage
//!
//! ```bash
//! liher-cli admin create -e admin@liherfashion.co -p 'Rst!7uWq' \
//!     --first-name Laura --last-name Hernández
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use liher_core::{Email, EmailError, UserId, password, password::PasswordError};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while managing staff accounts.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Connection or environment error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email address.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password fails the shared policy, or hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// An account with this email already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),
}

/// Create a superuser staff account.
///
/// The account is activated immediately (no activation email) and a
/// permission row with every section enabled is written alongside it, so
/// the panel works the same whether the superuser check or the flags are
/// consulted.
///
/// # Errors
///
/// Returns an error if the email or password is rejected, an account with
/// the email already exists, or the database writes fail.
pub async fn create_superuser(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    password::validate(password)?;
    let password_hash = password::hash(password)?;

    let pool = connect().await?;

    tracing::info!("Creating superuser: {email}");

    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM usuarios WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(AdminError::UserExists(email.into_inner()));
    }

    let mut tx = pool.begin().await?;

    let user_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO usuarios (email, password_hash, first_name, last_name, is_active, is_staff, is_superuser)
        VALUES ($1, $2, $3, $4, TRUE, TRUE, TRUE)
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r"
        INSERT INTO permisos_usuarios_admin
            (usuario_id, inicio, inventario, catalogo, pedidos, usuarios, devoluciones, peticiones)
        VALUES ($1, TRUE, TRUE, TRUE, TRUE, TRUE, TRUE, TRUE)
        ",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Superuser created. ID: {user_id}, email: {email}");
    Ok(UserId::new(user_id))
}
