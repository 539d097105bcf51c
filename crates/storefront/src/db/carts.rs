//! Cart repository: carts and their items.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{CartId, CartItemId, Money, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartItem, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    created_at: DateTime<Utc>,
    completed: bool,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            completed: row.completed,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    variant_id: VariantId,
    quantity: i32,
    unit_price: Money,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: CartItemId,
    variant_id: VariantId,
    product_name: String,
    reference: String,
    size_name: String,
    color_name: String,
    image: Option<String>,
    quantity: i32,
    unit_price: Money,
    stock: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item_id: row.item_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            reference: row.reference,
            size_name: row.size_name,
            color_name: row.color_name,
            image: row.image,
            quantity: row.quantity,
            unit_price: row.unit_price,
            stock: row.stock,
        }
    }
}

const CART_COLUMNS: &str =
    "id, usuario_id AS user_id, fecha_creacion AS created_at, completado AS completed";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a cart by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carrito WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    /// The user's oldest incomplete cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_open_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carrito
             WHERE usuario_id = $1 AND NOT completado
             ORDER BY id
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    /// Create a cart, owned by a user or anonymous.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, user_id: Option<UserId>) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "INSERT INTO carrito (usuario_id) VALUES ($1) RETURNING {CART_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All lines of a cart with product and variant display fields, in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT ic.id AS item_id, ic.variante_id AS variant_id,
                    p.nombre AS product_name, p.referencia AS reference,
                    t.nombre AS size_name, col.nombre AS color_name,
                    COALESCE(v.imagen, p.imagen) AS image,
                    ic.cantidad AS quantity, ic.precio_unitario AS unit_price,
                    v.stock
             FROM item_carrito ic
             JOIN variante_producto v ON v.id = ic.variante_id
             JOIN producto p ON p.id = v.producto_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color col ON col.id = v.color_id
             WHERE ic.carrito_id = $1
             ORDER BY ic.id",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Total number of units in a cart (for the header badge).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_units(&self, cart_id: CartId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cantidad), 0) FROM item_carrito WHERE carrito_id = $1",
        )
        .bind(cart_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Quantity already in the cart for a variant, if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_quantity(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
    ) -> Result<Option<i32>, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT cantidad FROM item_carrito WHERE carrito_id = $1 AND variante_id = $2",
        )
        .bind(cart_id)
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity)
    }

    /// Add units of a variant to a cart, merging with an existing line.
    ///
    /// The unit price is captured on first insert and left unchanged when
    /// the line already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO item_carrito (carrito_id, variante_id, cantidad, precio_unitario)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (carrito_id, variante_id)
             DO UPDATE SET cantidad = item_carrito.cantidad + EXCLUDED.cantidad
             RETURNING id, carrito_id AS cart_id, variante_id AS variant_id,
                       cantidad AS quantity, precio_unitario AS unit_price",
        )
        .bind(cart_id)
        .bind(variant_id)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a cart item by id, scoped to a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, carrito_id AS cart_id, variante_id AS variant_id,
                    cantidad AS quantity, precio_unitario AS unit_price
             FROM item_carrito
             WHERE id = $1 AND carrito_id = $2",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CartItem::from))
    }

    /// Set the absolute quantity of a cart item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE item_carrito SET cantidad = $1 WHERE id = $2 AND carrito_id = $3",
        )
        .bind(quantity)
        .bind(item_id)
        .bind(cart_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove an item from a cart.
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted, `false` if the item didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM item_carrito WHERE id = $1 AND carrito_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line from a cart.
    ///
    /// # Returns
    ///
    /// The number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM item_carrito WHERE carrito_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
