//! Account repository for the user-management section and staff login.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{Email, UserId};

use super::RepositoryError;
use crate::models::users::{ManagedUser, UserCounts};

/// Database row for `usuarios`.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for ManagedUser {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            date_joined: row.date_joined,
            last_login: row.last_login,
        })
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, \
     is_active, is_staff, is_superuser, date_joined, last_login";

/// Repository for account operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account together with its password hash, by email.
    ///
    /// Used by the staff login; the handler decides whether the account
    /// may enter (is_staff, is_active).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(ManagedUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let hash = row.password_hash.clone();
        Ok(Some((row.try_into()?, hash)))
    }

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<ManagedUser>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ManagedUser::try_from).transpose()
    }

    /// Every account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ManagedUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM usuarios ORDER BY date_joined DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ManagedUser::try_from).collect()
    }

    /// Header counts for the user list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<UserCounts, RepositoryError> {
        let (total, active, admins): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE is_active),
                    COUNT(*) FILTER (WHERE is_staff)
             FROM usuarios",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(UserCounts {
            total,
            active,
            admins,
        })
    }

    /// Create an account from the user-management form.
    ///
    /// The account starts inactive; the owner activates it from the
    /// emailed link, exactly like a self-registered customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        is_staff: bool,
    ) -> Result<ManagedUser, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO usuarios
                 (email, password_hash, first_name, last_name, phone, is_active, is_staff)
             VALUES ($1, $2, $3, $4, $5, FALSE, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(is_staff)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "email already exists"))?;

        row.try_into()
    }

    /// Update the fields the edit form exposes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    pub async fn update_details(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        is_staff: bool,
        is_active: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE usuarios
             SET first_name = $1, last_name = $2, phone = $3, is_staff = $4, is_active = $5
             WHERE id = $6",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(is_staff)
        .bind(is_active)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Flip an account's active flag, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    pub async fn toggle_active(&self, id: UserId) -> Result<bool, RepositoryError> {
        let new_state: Option<bool> = sqlx::query_scalar(
            "UPDATE usuarios SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        new_state.ok_or(RepositoryError::NotFound)
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE usuarios SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
