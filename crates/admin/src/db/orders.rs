//! Order repository for the read-only order pages.
//!
//! Orders are written by the storefront when a payment is approved; the
//! panel only lists and inspects them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{Money, OrderId, OrderItemId, PaymentStatus, UserId, VariantId};

use super::RepositoryError;
use crate::models::orders::{OrderLine, OrderSummary};

/// Database row for `pedidos` with its line count.
#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    user_id: Option<UserId>,
    customer: String,
    date: DateTime<Utc>,
    status: String,
    payment_method: String,
    total: Money,
    payment_status: Option<String>,
    external_reference: Option<String>,
    item_count: i64,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown order status '{}'", row.status))
        })?;
        let payment_status = row
            .payment_status
            .as_deref()
            .map_or(PaymentStatus::Unknown, PaymentStatus::from_wire);

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            customer: row.customer,
            date: row.date,
            status,
            payment_method: row.payment_method,
            total: row.total,
            payment_status,
            external_reference: row.external_reference,
            item_count: row.item_count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    item_id: OrderItemId,
    variant_id: VariantId,
    product_name: String,
    reference: String,
    size_name: String,
    color_name: String,
    quantity: i32,
    unit_price: Money,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            item_id: row.item_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            reference: row.reference,
            size_name: row.size_name,
            color_name: row.color_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

const SUMMARY_COLUMNS: &str = "o.id, o.usuario_id AS user_id, o.cliente AS customer, \
     o.fecha AS date, o.estado_pedido AS status, o.metodo_pago AS payment_method, \
     o.total, o.estado_pago AS payment_status, o.external_reference, \
     COUNT(i.id) AS item_count";

const SUMMARY_JOINS: &str =
    "FROM pedidos o LEFT JOIN item_pedido i ON i.pedido_id = o.id";

const SUMMARY_GROUP: &str = "GROUP BY o.id";

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} {SUMMARY_JOINS} {SUMMARY_GROUP}
             ORDER BY o.fecha DESC, o.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderSummary::try_from).collect()
    }

    /// One order's summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} {SUMMARY_JOINS} WHERE o.id = $1 {SUMMARY_GROUP}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderSummary::try_from).transpose()
    }

    /// An order's lines with product names resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT i.id AS item_id, i.variante_id AS variant_id,
                    p.nombre AS product_name, p.referencia AS reference,
                    t.nombre AS size_name, c.nombre AS color_name,
                    i.cantidad AS quantity, i.precio_unitario AS unit_price
             FROM item_pedido i
             JOIN variante_producto v ON v.id = i.variante_id
             JOIN producto p ON p.id = v.producto_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color c ON c.id = v.color_id
             WHERE i.pedido_id = $1
             ORDER BY i.id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }
}
