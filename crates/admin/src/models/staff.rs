//! Panel sections and per-section permission flags.
//!
//! Non-superuser staff see only the sections an administrator granted them.
//! The flags live in `permisos_usuarios_admin`, one row per staff account;
//! superusers bypass the flags entirely.

use serde::{Deserialize, Serialize};

/// A section of the back-office panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Inicio,
    Inventario,
    Catalogo,
    Pedidos,
    Usuarios,
    Devoluciones,
    Peticiones,
}

impl Section {
    /// Every section, in sidebar order.
    pub const ALL: [Self; 7] = [
        Self::Inicio,
        Self::Inventario,
        Self::Catalogo,
        Self::Pedidos,
        Self::Usuarios,
        Self::Devoluciones,
        Self::Peticiones,
    ];

    /// The flag name stored in the database and sent in permission JSON.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Inicio => "inicio",
            Self::Inventario => "inventario",
            Self::Catalogo => "catalogo",
            Self::Pedidos => "pedidos",
            Self::Usuarios => "usuarios",
            Self::Devoluciones => "devoluciones",
            Self::Peticiones => "peticiones",
        }
    }

    /// Sidebar label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inicio => "Inicio",
            Self::Inventario => "Inventario",
            Self::Catalogo => "Catálogo",
            Self::Pedidos => "Pedidos",
            Self::Usuarios => "Usuarios",
            Self::Devoluciones => "Devoluciones",
            Self::Peticiones => "Peticiones",
        }
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inicio" => Ok(Self::Inicio),
            "inventario" => Ok(Self::Inventario),
            "catalogo" => Ok(Self::Catalogo),
            "pedidos" => Ok(Self::Pedidos),
            "usuarios" => Ok(Self::Usuarios),
            "devoluciones" => Ok(Self::Devoluciones),
            "peticiones" => Ok(Self::Peticiones),
            _ => Err(format!("invalid panel section: {s}")),
        }
    }
}

/// Per-section permission flags for one staff account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub inicio: bool,
    pub inventario: bool,
    pub catalogo: bool,
    pub pedidos: bool,
    pub usuarios: bool,
    pub devoluciones: bool,
    pub peticiones: bool,
}

impl PermissionSet {
    /// Every flag granted. Stored for superuser-created accounts that
    /// should see the whole panel without being superusers themselves.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            inicio: true,
            inventario: true,
            catalogo: true,
            pedidos: true,
            usuarios: true,
            devoluciones: true,
            peticiones: true,
        }
    }

    /// Whether the flag for `section` is granted.
    #[must_use]
    pub const fn allows(&self, section: Section) -> bool {
        match section {
            Section::Inicio => self.inicio,
            Section::Inventario => self.inventario,
            Section::Catalogo => self.catalogo,
            Section::Pedidos => self.pedidos,
            Section::Usuarios => self.usuarios,
            Section::Devoluciones => self.devoluciones,
            Section::Peticiones => self.peticiones,
        }
    }

    /// Grant or revoke the flag for `section`.
    pub const fn set(&mut self, section: Section, granted: bool) {
        match section {
            Section::Inicio => self.inicio = granted,
            Section::Inventario => self.inventario = granted,
            Section::Catalogo => self.catalogo = granted,
            Section::Pedidos => self.pedidos = granted,
            Section::Usuarios => self.usuarios = granted,
            Section::Devoluciones => self.devoluciones = granted,
            Section::Peticiones => self.peticiones = granted,
        }
    }

    /// Build a permission set from a list of section keys, ignoring
    /// anything unrecognized. This is the shape the user-management
    /// JavaScript sends: `["inventario", "pedidos"]`.
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for key in keys {
            if let Ok(section) = key.as_ref().parse::<Section>() {
                set.set(section, true);
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_keys_round_trip() {
        for section in Section::ALL {
            assert_eq!(section.key().parse::<Section>(), Ok(section));
        }
    }

    #[test]
    fn from_keys_builds_granted_flags() {
        let set = PermissionSet::from_keys(["inventario", "pedidos"]);
        assert!(set.allows(Section::Inventario));
        assert!(set.allows(Section::Pedidos));
        assert!(!set.allows(Section::Usuarios));
    }

    #[test]
    fn from_keys_ignores_unknown_values() {
        let set = PermissionSet::from_keys(["inventario", "contabilidad"]);
        assert!(set.allows(Section::Inventario));
        assert_eq!(
            set,
            PermissionSet {
                inventario: true,
                ..PermissionSet::default()
            }
        );
    }

    #[test]
    fn all_grants_every_section() {
        let set = PermissionSet::all();
        for section in Section::ALL {
            assert!(set.allows(section));
        }
    }

    #[test]
    fn set_toggles_a_single_flag() {
        let mut set = PermissionSet::all();
        set.set(Section::Devoluciones, false);
        assert!(!set.allows(Section::Devoluciones));
        assert!(set.allows(Section::Pedidos));
    }
}
