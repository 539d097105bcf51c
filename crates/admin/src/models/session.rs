//! Session-related types.

use serde::{Deserialize, Serialize};

use liher_core::{Email, UserId};

use super::staff::{PermissionSet, Section};

/// Session-stored staff identity.
///
/// Carries the permission flags captured at login; edits to a staff
/// member's flags apply the next time they log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStaff {
    /// Staff member's database ID.
    pub id: UserId,
    /// Staff member's email address.
    pub email: Email,
    /// Given name, for the header greeting.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Superusers bypass the per-section flags.
    pub is_superuser: bool,
    /// Per-section flags captured at login.
    pub permissions: PermissionSet,
}

impl CurrentStaff {
    /// Whether this staff member may open `section`.
    #[must_use]
    pub const fn can(&self, section: Section) -> bool {
        self.is_superuser || self.permissions.allows(section)
    }
}

/// Session keys for the back-office.
pub mod keys {
    /// Key for storing the logged-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(is_superuser: bool, permissions: PermissionSet) -> CurrentStaff {
        CurrentStaff {
            id: UserId::new(7),
            email: Email::parse("staff@liherfashion.co").expect("valid email"),
            first_name: "Laura".to_string(),
            last_name: "Hernández".to_string(),
            is_superuser,
            permissions,
        }
    }

    #[test]
    fn superuser_bypasses_flags() {
        let staff = staff(true, PermissionSet::default());
        assert!(staff.can(Section::Usuarios));
    }

    #[test]
    fn regular_staff_follow_flags() {
        let staff = staff(
            false,
            PermissionSet {
                pedidos: true,
                ..PermissionSet::default()
            },
        );
        assert!(staff.can(Section::Pedidos));
        assert!(!staff.can(Section::Inventario));
    }
}
