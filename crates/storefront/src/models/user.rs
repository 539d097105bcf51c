//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use liher_core::{Email, UserId};

/// A registered account (domain type).
///
/// Customers and staff share this table; staff accounts additionally have
/// a permission row consumed by the admin server.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (login identifier).
    pub email: Email,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone, set for admin-created accounts.
    pub phone: Option<String>,
    /// Whether the account has been activated via the emailed link.
    pub is_active: bool,
    /// Whether the user may log into the admin server.
    pub is_staff: bool,
    /// Whether the user bypasses per-section permission checks.
    pub is_superuser: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Display name, falling back to the email local part when both name
    /// fields are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let trimmed = full.trim();
        if trimmed.is_empty() {
            self.email
                .as_str()
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("ana@example.com").unwrap(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn display_name_joins_names() {
        assert_eq!(user("Ana", "Gómez").display_name(), "Ana Gómez");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        assert_eq!(user("", "").display_name(), "ana");
        assert_eq!(user("  ", "").display_name(), "ana");
    }
}
