//! Authentication service.
//!
//! Registration with emailed activation links, password login, and
//! password reset. Staff accounts authenticate here like anyone else but
//! are redirected to the admin server after login.
//!
//! The password policy and token signing live in [`liher_core::password`]
//! and [`liher_core::tokens`] so the admin server mints identical
//! activation links for the accounts it creates.

mod error;

pub use error::AuthError;

use secrecy::SecretString;
use sqlx::PgPool;

use liher_core::{Email, password, tokens};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Authentication service.
///
/// Wraps the user repository with validation, hashing and the signed
/// activation/reset tokens.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    token_secret: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, token_secret: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            token_secret,
        }
    }

    /// Register a new customer account.
    ///
    /// The account is created inactive; the caller emails the activation
    /// link built from [`Self::activation_link_parts`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` / `AuthError::PasswordMismatch` if
    /// the password fails validation.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password_pair(password, password_confirm)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash, first_name.trim(), last_name.trim())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Database(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Records the login timestamp on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountInactive` if the password is right but the
    /// account was never activated.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        self.users.touch_last_login(user.id).await?;

        Ok(user)
    }

    /// The `(uid, token)` pair for a user's activation link.
    #[must_use]
    pub fn activation_link_parts(&self, user: &User) -> (String, String) {
        let claim = tokens::activation_claim(user.id, user.is_active);
        (
            tokens::encode_uid(user.id),
            tokens::generate(self.token_secret, &claim),
        )
    }

    /// Activate the account an activation link points at.
    ///
    /// The token commits to the inactive state, so a link that was
    /// already used (or a token minted before a state change) no longer
    /// verifies.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the link is malformed, expired,
    /// or stale.
    pub async fn activate(&self, uid: &str, token: &str) -> Result<User, AuthError> {
        let user_id = tokens::decode_uid(uid).ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let claim = tokens::activation_claim(user.id, user.is_active);
        if !tokens::verify(self.token_secret, &claim, token) {
            return Err(AuthError::InvalidToken);
        }

        self.users.activate(user.id).await?;

        self.users
            .get_by_id(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Start a password reset for an email.
    ///
    /// Returns the user and the `(uid, token)` pair when an account
    /// exists; `None` otherwise. Inactive accounts may reset too (the
    /// reset doubles as activation).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String, String)>, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let password_hash = self.users.get_password_hash(user.id).await?;
        let claim = reset_claim(&user, &password_hash);
        let uid = tokens::encode_uid(user.id);
        let token = tokens::generate(self.token_secret, &claim);

        Ok(Some((user, uid, token)))
    }

    /// Check a reset link without consuming it (for rendering the form).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the link is malformed, expired,
    /// or stale.
    pub async fn check_reset_token(&self, uid: &str, token: &str) -> Result<User, AuthError> {
        let user_id = tokens::decode_uid(uid).ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let password_hash = self.users.get_password_hash(user.id).await?;
        let claim = reset_claim(&user, &password_hash);
        if !tokens::verify(self.token_secret, &claim, token) {
            return Err(AuthError::InvalidToken);
        }

        Ok(user)
    }

    /// Complete a password reset.
    ///
    /// Replacing the hash invalidates every outstanding reset token for
    /// the user. An inactive account is activated as part of the reset,
    /// since following the emailed link proves mailbox ownership.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the link is invalid.
    /// Returns `AuthError::WeakPassword` / `AuthError::PasswordMismatch` if
    /// the new password fails validation.
    pub async fn reset_password(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<User, AuthError> {
        let user = self.check_reset_token(uid, token).await?;

        validate_password_pair(new_password, confirm)?;
        let password_hash = hash_password(new_password)?;

        self.users.update_password(user.id, &password_hash).await?;

        if !user.is_active {
            self.users.activate(user.id).await?;
        }

        self.users
            .get_by_id(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Claim string a reset token commits to, from the user's current state.
fn reset_claim(user: &User, password_hash: &str) -> String {
    tokens::reset_claim(
        user.id,
        password_hash,
        user.last_login.map(|t| t.timestamp()),
    )
}

/// Validate a password and its confirmation together.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` when the two differ, otherwise
/// any `AuthError::WeakPassword` from the policy.
pub fn validate_password_pair(password: &str, confirm: &str) -> Result<(), AuthError> {
    password::validate_pair(password, confirm)?;
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(password::hash(password)?)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    if password::verify(password, hash) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_errors_map_to_auth_errors() {
        assert!(matches!(
            validate_password_pair("corta", "corta"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password_pair("Rst!7uWq", "Rst!7uWr"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_password_pair("Rst!7uWq", "Rst!7uWq").is_ok());
    }

    #[test]
    fn verify_maps_failure_to_invalid_credentials() {
        let hash = hash_password("Rst!7uWq").unwrap();
        assert!(verify_password("Rst!7uWq", &hash).is_ok());
        assert!(matches!(
            verify_password("otra", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
