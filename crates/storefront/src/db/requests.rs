//! Product request repository.
//!
//! Customers can ask to be notified about an out-of-stock variant; the
//! requests land on the admin's peticiones board.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{ProductRequestId, UserId, VariantId};

use super::RepositoryError;
use crate::models::catalog::ProductRequest;

#[derive(Debug, sqlx::FromRow)]
struct ProductRequestRow {
    id: ProductRequestId,
    user_id: UserId,
    variant_id: VariantId,
    quantity: i32,
    requested_at: DateTime<Utc>,
    attended: bool,
}

impl From<ProductRequestRow> for ProductRequest {
    fn from(row: ProductRequestRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            requested_at: row.requested_at,
            attended: row.attended,
        }
    }
}

/// Repository for product request operations.
pub struct ProductRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRequestRepository<'a> {
    /// Create a new product request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a request for an out-of-stock variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<ProductRequest, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRequestRow>(
            "INSERT INTO peticiones_producto (usuario_id, variante_id, cantidad_solicitada)
             VALUES ($1, $2, $3)
             RETURNING id, usuario_id AS user_id, variante_id AS variant_id,
                       cantidad_solicitada AS quantity, fecha_peticion AS requested_at,
                       atendida AS attended",
        )
        .bind(user_id)
        .bind(variant_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
