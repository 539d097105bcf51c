//! Product request repository for the peticiones board.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{ProductRequestId, VariantId};

use super::RepositoryError;
use crate::models::requests::ProductRequest;

#[derive(Debug, sqlx::FromRow)]
struct ProductRequestRow {
    id: ProductRequestId,
    variant_id: VariantId,
    customer_name: String,
    customer_email: String,
    product_name: String,
    reference: String,
    size_name: String,
    color_name: String,
    quantity: i32,
    current_stock: i32,
    requested_at: DateTime<Utc>,
    attended: bool,
}

impl From<ProductRequestRow> for ProductRequest {
    fn from(row: ProductRequestRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            product_name: row.product_name,
            reference: row.reference,
            size_name: row.size_name,
            color_name: row.color_name,
            quantity: row.quantity,
            current_stock: row.current_stock,
            requested_at: row.requested_at,
            attended: row.attended,
        }
    }
}

/// Repository for out-of-stock product requests.
pub struct RequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestRepository<'a> {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every request, newest first, with the requester and the variant's
    /// current stock so staff can see which are fulfillable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ProductRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRequestRow>(
            "SELECT pr.id, pr.variante_id AS variant_id,
                    TRIM(u.first_name || ' ' || u.last_name) AS customer_name,
                    u.email AS customer_email,
                    p.nombre AS product_name, p.referencia AS reference,
                    t.nombre AS size_name, c.nombre AS color_name,
                    pr.cantidad_solicitada AS quantity, v.stock AS current_stock,
                    pr.fecha_peticion AS requested_at, pr.atendida AS attended
             FROM peticiones_producto pr
             JOIN usuarios u ON u.id = pr.usuario_id
             JOIN variante_producto v ON v.id = pr.variante_id
             JOIN producto p ON p.id = v.producto_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color c ON c.id = v.color_id
             ORDER BY pr.fecha_peticion DESC, pr.id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRequest::from).collect())
    }

    /// Mark a request as attended.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist and
    /// `RepositoryError::Database` if the query fails.
    pub async fn attend(&self, id: ProductRequestId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE peticiones_producto SET atendida = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
