//! Lookup-table repository: categories, colors and sizes.
//!
//! All three tables are a bare `id, nombre` pair; uniqueness is enforced
//! case-insensitively here because the column constraint alone would let
//! `Rojo` and `rojo` coexist.

use sqlx::PgPool;

use liher_core::{CategoryId, ColorId, SizeId};

use super::RepositoryError;
use crate::models::catalog::LookupEntry;

/// Which lookup table an operation targets.
#[derive(Debug, Clone, Copy)]
enum LookupTable {
    Category,
    Color,
    Size,
}

impl LookupTable {
    const fn table(self) -> &'static str {
        match self {
            Self::Category => "categoria",
            Self::Color => "color",
            Self::Size => "talla",
        }
    }

    /// Join that counts how many rows reference the entry.
    const fn usage_join(self) -> &'static str {
        match self {
            Self::Category => "LEFT JOIN producto u ON u.categoria_id = l.id",
            Self::Color => "LEFT JOIN variante_producto u ON u.color_id = l.id",
            Self::Size => "LEFT JOIN variante_producto u ON u.talla_id = l.id",
        }
    }

    const fn conflict_msg(self) -> &'static str {
        match self {
            Self::Category => "category name already exists",
            Self::Color => "color name already exists",
            Self::Size => "size name already exists",
        }
    }

    const fn referenced_msg(self) -> &'static str {
        match self {
            Self::Category => "category still referenced",
            Self::Color => "color still referenced by variants",
            Self::Size => "size still referenced by variants",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LookupRow {
    id: i32,
    name: String,
    in_use: i64,
}

impl From<LookupRow> for LookupEntry {
    fn from(row: LookupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            in_use: row.in_use,
        }
    }
}

/// Repository for the catalog lookup tables.
pub struct LookupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LookupRepository<'a> {
    /// Create a new lookup repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn list(&self, table: LookupTable) -> Result<Vec<LookupEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, LookupRow>(&format!(
            "SELECT l.id, l.nombre AS name, COUNT(u.id) AS in_use
             FROM {table} l {join}
             GROUP BY l.id
             ORDER BY l.nombre",
            table = table.table(),
            join = table.usage_join(),
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(LookupEntry::from).collect())
    }

    /// Insert unless a case-insensitive duplicate exists.
    async fn create(&self, table: LookupTable, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {table} (nombre)
             SELECT $1
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE LOWER(nombre) = LOWER($1))",
            table = table.table(),
        ))
        .bind(name)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, table.conflict_msg()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(table.conflict_msg().to_owned()));
        }

        Ok(())
    }

    /// Rename unless another entry already holds the name.
    async fn rename(
        &self,
        table: LookupTable,
        id: i32,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let clash: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {table} WHERE LOWER(nombre) = LOWER($1) AND id <> $2)",
            table = table.table(),
        ))
        .bind(name)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        if clash {
            return Err(RepositoryError::Conflict(table.conflict_msg().to_owned()));
        }

        let result = sqlx::query(&format!(
            "UPDATE {table} SET nombre = $1 WHERE id = $2",
            table = table.table(),
        ))
        .bind(name)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, table.conflict_msg()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, table: LookupTable, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE id = $1",
            table = table.table(),
        ))
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx_referenced(e, table.referenced_msg()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Categories with their product counts, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<LookupEntry>, RepositoryError> {
        self.list(LookupTable::Category).await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate.
    pub async fn create_category(&self, name: &str) -> Result<(), RepositoryError> {
        self.create(LookupTable::Category, name).await
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate,
    /// `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        self.rename(LookupTable::Category, id.as_i32(), name).await
    }

    /// Delete a category. Products referencing it keep a null category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        self.delete(LookupTable::Category, id.as_i32()).await
    }

    /// Colors with their variant counts, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_colors(&self) -> Result<Vec<LookupEntry>, RepositoryError> {
        self.list(LookupTable::Color).await
    }

    /// Create a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate.
    pub async fn create_color(&self, name: &str) -> Result<(), RepositoryError> {
        self.create(LookupTable::Color, name).await
    }

    /// Rename a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate,
    /// `RepositoryError::NotFound` if the color doesn't exist.
    pub async fn rename_color(&self, id: ColorId, name: &str) -> Result<(), RepositoryError> {
        self.rename(LookupTable::Color, id.as_i32(), name).await
    }

    /// Delete a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while variants reference it,
    /// `RepositoryError::NotFound` if the color doesn't exist.
    pub async fn delete_color(&self, id: ColorId) -> Result<(), RepositoryError> {
        self.delete(LookupTable::Color, id.as_i32()).await
    }

    /// Sizes with their variant counts, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_sizes(&self) -> Result<Vec<LookupEntry>, RepositoryError> {
        self.list(LookupTable::Size).await
    }

    /// Create a size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate.
    pub async fn create_size(&self, name: &str) -> Result<(), RepositoryError> {
        self.create(LookupTable::Size, name).await
    }

    /// Rename a size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a case-insensitive duplicate,
    /// `RepositoryError::NotFound` if the size doesn't exist.
    pub async fn rename_size(&self, id: SizeId, name: &str) -> Result<(), RepositoryError> {
        self.rename(LookupTable::Size, id.as_i32(), name).await
    }

    /// Delete a size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while variants reference it,
    /// `RepositoryError::NotFound` if the size doesn't exist.
    pub async fn delete_size(&self, id: SizeId) -> Result<(), RepositoryError> {
        self.delete(LookupTable::Size, id.as_i32()).await
    }
}
