//! Received-stock entries and the movement history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{ProductId, StockEntryId, VariantId};

use super::RepositoryError;
use crate::models::inventory::StockEntry;

/// Database row for `entrada_inventario` with the variant labels resolved.
#[derive(Debug, sqlx::FromRow)]
struct StockEntryRow {
    id: StockEntryId,
    variant_id: VariantId,
    size_name: String,
    color_name: String,
    quantity: i32,
    received_at: DateTime<Utc>,
}

impl From<StockEntryRow> for StockEntry {
    fn from(row: StockEntryRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            size_name: row.size_name,
            color_name: row.color_name,
            quantity: row.quantity,
            received_at: row.received_at,
        }
    }
}

/// Repository for stock entries.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    /// Create a new stock repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a received entry and add its units to the variant's stock,
    /// in one transaction. Returns the variant's new stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    pub async fn record_entry(
        &self,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let new_stock: Option<i32> = sqlx::query_scalar(
            "UPDATE variante_producto SET stock = stock + $1 WHERE id = $2 RETURNING stock",
        )
        .bind(quantity)
        .bind(variant_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_stock) = new_stock else {
            return Err(RepositoryError::NotFound);
        };

        sqlx::query("INSERT INTO entrada_inventario (variante_id, cantidad_ingreso) VALUES ($1, $2)")
            .bind(variant_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(new_stock)
    }

    /// A product's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn entries_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<StockEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockEntryRow>(
            "SELECT e.id, e.variante_id AS variant_id, t.nombre AS size_name,
                    c.nombre AS color_name, e.cantidad_ingreso AS quantity,
                    e.fecha_entrada AS received_at
             FROM entrada_inventario e
             JOIN variante_producto v ON v.id = e.variante_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color c ON c.id = v.color_id
             WHERE v.producto_id = $1
             ORDER BY e.fecha_entrada DESC, e.id DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StockEntry::from).collect())
    }
}
