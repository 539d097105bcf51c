//! Per-section permission flags for staff accounts.

use sqlx::PgPool;

use liher_core::UserId;

use super::RepositoryError;
use crate::models::PermissionSet;

/// Database row for `permisos_usuarios_admin`.
#[derive(Debug, sqlx::FromRow)]
struct PermissionRow {
    inicio: bool,
    inventario: bool,
    catalogo: bool,
    pedidos: bool,
    usuarios: bool,
    devoluciones: bool,
    peticiones: bool,
}

impl From<PermissionRow> for PermissionSet {
    fn from(row: PermissionRow) -> Self {
        Self {
            inicio: row.inicio,
            inventario: row.inventario,
            catalogo: row.catalogo,
            pedidos: row.pedidos,
            usuarios: row.usuarios,
            devoluciones: row.devoluciones,
            peticiones: row.peticiones,
        }
    }
}

/// Repository for staff permission flags.
pub struct PermissionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PermissionRepository<'a> {
    /// Create a new permission repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the flags for a staff account.
    ///
    /// Accounts without a row (customers, or staff created before flags
    /// existed) get no sections; superusers never consult the flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<PermissionSet, RepositoryError> {
        let row = sqlx::query_as::<_, PermissionRow>(
            "SELECT inicio, inventario, catalogo, pedidos, usuarios, devoluciones, peticiones
             FROM permisos_usuarios_admin WHERE usuario_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(PermissionSet::from).unwrap_or_default())
    }

    /// Write the flags for a staff account, creating the row on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        permissions: &PermissionSet,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO permisos_usuarios_admin
                 (usuario_id, inicio, inventario, catalogo, pedidos, usuarios,
                  devoluciones, peticiones)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (usuario_id) DO UPDATE SET
                 inicio = EXCLUDED.inicio,
                 inventario = EXCLUDED.inventario,
                 catalogo = EXCLUDED.catalogo,
                 pedidos = EXCLUDED.pedidos,
                 usuarios = EXCLUDED.usuarios,
                 devoluciones = EXCLUDED.devoluciones,
                 peticiones = EXCLUDED.peticiones",
        )
        .bind(user_id)
        .bind(permissions.inicio)
        .bind(permissions.inventario)
        .bind(permissions.catalogo)
        .bind(permissions.pedidos)
        .bind(permissions.usuarios)
        .bind(permissions.devoluciones)
        .bind(permissions.peticiones)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
