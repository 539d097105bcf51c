//! Account types for the user-management section.

use chrono::{DateTime, Utc};

use liher_core::{Email, UserId};

/// An account as the user-management section sees it.
///
/// Covers both customers and staff; the `is_staff` flag decides which
/// role the panel shows.
#[derive(Debug, Clone)]
pub struct ManagedUser {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl ManagedUser {
    /// Full name, or `Sin nombre` when both name fields are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let trimmed = full.trim();
        if trimmed.is_empty() {
            "Sin nombre".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Avatar initials from the name fields, or `??` when blank.
    #[must_use]
    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.chars().next();
        match (first, last) {
            (None, None) => "??".to_string(),
            (a, b) => a
                .into_iter()
                .chain(b)
                .flat_map(char::to_uppercase)
                .collect(),
        }
    }

    /// Role shown in the panel.
    #[must_use]
    pub const fn role_label(&self) -> &'static str {
        if self.is_staff { "Administrador" } else { "Usuario" }
    }

    /// Activation state shown in the panel.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.is_active { "Activo" } else { "Inactivo" }
    }

    /// Last login formatted for the detail card, `Nunca` before the
    /// first login.
    #[must_use]
    pub fn last_login_label(&self) -> String {
        self.last_login.map_or_else(
            || "Nunca".to_string(),
            |t| t.format("%d/%m/%Y %H:%M").to_string(),
        )
    }
}

/// Header counts for the user list.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub admins: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first_name: &str, last_name: &str) -> ManagedUser {
        ManagedUser {
            id: UserId::new(1),
            email: Email::parse("cliente@example.com").expect("valid email"),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn full_name_joins_and_trims() {
        assert_eq!(user("Ana", "Gómez").full_name(), "Ana Gómez");
        assert_eq!(user("Ana", "").full_name(), "Ana");
        assert_eq!(user("", "").full_name(), "Sin nombre");
    }

    #[test]
    fn initials_uppercase_or_placeholder() {
        assert_eq!(user("ana", "gómez").initials(), "AG");
        assert_eq!(user("Ana", "").initials(), "A");
        assert_eq!(user("", "").initials(), "??");
    }

    #[test]
    fn labels_follow_flags() {
        let mut u = user("Ana", "Gómez");
        assert_eq!(u.role_label(), "Usuario");
        assert_eq!(u.status_label(), "Activo");

        u.is_staff = true;
        u.is_active = false;
        assert_eq!(u.role_label(), "Administrador");
        assert_eq!(u.status_label(), "Inactivo");
    }

    #[test]
    fn last_login_label_formats_or_never() {
        let mut u = user("Ana", "Gómez");
        assert_eq!(u.last_login_label(), "Nunca");

        u.last_login = Some(
            chrono::DateTime::parse_from_rfc3339("2026-03-04T15:30:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        );
        assert_eq!(u.last_login_label(), "04/03/2026 15:30");
    }
}
