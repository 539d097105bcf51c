//! Checkout repository: identification, shipping addresses and orders.
//!
//! The approved-payment path is the one multi-row mutation in the system
//! and runs as a single transaction: stock deduction, order insert, order
//! lines, cart completion. Concurrent callbacks for the same cart see the
//! `FOR UPDATE` row lock and bail out on the completed flag.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{
    CartId, DocumentType, Email, IdentificationId, Money, OrderId, OrderItemId, OrderStatus,
    PaymentStatus, ShippingAddressId, ShippingCarrier, UserId, VariantId,
};

use super::RepositoryError;
use crate::models::checkout::{Identification, Order, OrderLine, ShippingAddress};

#[derive(Debug, sqlx::FromRow)]
struct IdentificationRow {
    id: IdentificationId,
    user_id: Option<UserId>,
    email: String,
    first_name: String,
    last_name: String,
    document_type: String,
    document_number: String,
    phone: String,
}

impl TryFrom<IdentificationRow> for Identification {
    type Error = RepositoryError;

    fn try_from(row: IdentificationRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let document_type: DocumentType = row.document_type.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "unknown document type '{}'",
                row.document_type
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            document_type,
            document_number: row.document_number,
            phone: row.phone,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShippingRow {
    id: ShippingAddressId,
    user_id: Option<UserId>,
    identification_id: Option<IdentificationId>,
    department: String,
    municipality: String,
    address_type: String,
    street: String,
    letter: String,
    number: String,
    neighborhood: String,
    floor: Option<String>,
    receiver_name: String,
    receiver_phone: String,
    carrier: String,
    cost: Money,
    active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShippingRow> for ShippingAddress {
    type Error = RepositoryError;

    fn try_from(row: ShippingRow) -> Result<Self, Self::Error> {
        let carrier: ShippingCarrier = row.carrier.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown carrier '{}'", row.carrier))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            identification_id: row.identification_id,
            department: row.department,
            municipality: row.municipality,
            address_type: row.address_type,
            street: row.street,
            letter: row.letter,
            number: row.number,
            neighborhood: row.neighborhood,
            floor: row.floor,
            receiver_name: row.receiver_name,
            receiver_phone: row.receiver_phone,
            carrier,
            cost: row.cost,
            active: row.active,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    customer: String,
    date: DateTime<Utc>,
    status: String,
    payment_method: String,
    total: Money,
    payment_status: String,
    external_reference: Option<String>,
    payment_id: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown order status '{}'", row.status))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            customer: row.customer,
            date: row.date,
            status,
            payment_method: row.payment_method,
            total: row.total,
            payment_status: PaymentStatus::from_wire(&row.payment_status),
            external_reference: row.external_reference,
            payment_id: row.payment_id,
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
    image: Option<String>,
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
            image: row.image,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Fields captured in the identification step.
#[derive(Debug, Clone)]
pub struct IdentificationInput<'a> {
    pub email: &'a Email,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub document_type: DocumentType,
    pub document_number: &'a str,
    pub phone: &'a str,
}

/// Fields captured in the shipping step.
#[derive(Debug, Clone)]
pub struct ShippingInput<'a> {
    pub department: &'a str,
    pub municipality: &'a str,
    pub address_type: &'a str,
    pub street: &'a str,
    pub letter: &'a str,
    pub number: &'a str,
    pub neighborhood: &'a str,
    pub floor: Option<&'a str>,
    pub receiver_name: &'a str,
    pub receiver_phone: &'a str,
    pub carrier: ShippingCarrier,
    pub cost: Money,
}

/// Fields of the order written when a payment is approved.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer: String,
    pub payment_method: String,
    pub total: Money,
    pub payment_status: PaymentStatus,
    pub external_reference: String,
    pub payment_id: Option<String>,
}

/// Result of processing an approved payment for a cart.
#[derive(Debug)]
pub enum OrderOutcome {
    /// Stock was deducted and the order written.
    Created(Order),
    /// The cart had already been completed by an earlier callback.
    AlreadyCompleted,
}

const IDENTIFICATION_COLUMNS: &str = "id, usuario_id AS user_id, email, \
     nombre AS first_name, apellido AS last_name, tipo_documento AS document_type, \
     numero_documento AS document_number, celular AS phone";

const SHIPPING_COLUMNS: &str = "id, usuario_id AS user_id, \
     identificacion_id AS identification_id, departamento AS department, \
     municipio AS municipality, tipo_direccion AS address_type, calle AS street, \
     letra AS letter, numero AS number, barrio AS neighborhood, piso AS floor, \
     nombre_receptor AS receiver_name, telefono_receptor AS receiver_phone, \
     empresa_envio AS carrier, costo_envio AS cost, activo AS active, \
     fecha_actualizacion AS updated_at";

const ORDER_COLUMNS: &str = "id, usuario_id AS user_id, cliente AS customer, fecha AS date, \
     estado_pedido AS status, metodo_pago AS payment_method, total, \
     estado_pago AS payment_status, external_reference, payment_id";

/// Repository for checkout database operations.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an identification by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_identification(
        &self,
        id: IdentificationId,
    ) -> Result<Option<Identification>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentificationRow>(&format!(
            "SELECT {IDENTIFICATION_COLUMNS} FROM identificacion WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Identification::try_from).transpose()
    }

    /// Get a user's identification, if they have completed step one before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_identification_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Identification>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentificationRow>(&format!(
            "SELECT {IDENTIFICATION_COLUMNS} FROM identificacion WHERE usuario_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Identification::try_from).transpose()
    }

    /// Link an unowned identification matching the email to the user.
    ///
    /// Covers buyers who identified as guests before creating an account.
    /// Returns `None` when there is nothing to adopt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn adopt_identification_by_email(
        &self,
        user_id: UserId,
        email: &Email,
    ) -> Result<Option<Identification>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentificationRow>(&format!(
            "UPDATE identificacion SET usuario_id = $1
             WHERE email = $2 AND usuario_id IS NULL
             RETURNING {IDENTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Identification::try_from).transpose()
    }

    /// Insert or refresh the identification of a logged-in buyer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to another
    /// identification.
    pub async fn upsert_identification_for_user(
        &self,
        user_id: UserId,
        input: IdentificationInput<'_>,
    ) -> Result<Identification, RepositoryError> {
        let row = sqlx::query_as::<_, IdentificationRow>(&format!(
            "INSERT INTO identificacion
                 (usuario_id, email, nombre, apellido, tipo_documento, numero_documento, celular)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (usuario_id)
             DO UPDATE SET email = EXCLUDED.email,
                           nombre = EXCLUDED.nombre,
                           apellido = EXCLUDED.apellido,
                           tipo_documento = EXCLUDED.tipo_documento,
                           numero_documento = EXCLUDED.numero_documento,
                           celular = EXCLUDED.celular
             RETURNING {IDENTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(input.email.as_str())
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.document_type.code())
        .bind(input.document_number)
        .bind(input.phone)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "email already identified"))?;

        row.try_into()
    }

    /// Insert or refresh a guest identification, keyed by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_identification_for_guest(
        &self,
        input: IdentificationInput<'_>,
    ) -> Result<Identification, RepositoryError> {
        let row = sqlx::query_as::<_, IdentificationRow>(&format!(
            "INSERT INTO identificacion
                 (email, nombre, apellido, tipo_documento, numero_documento, celular)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (email)
             DO UPDATE SET nombre = EXCLUDED.nombre,
                           apellido = EXCLUDED.apellido,
                           tipo_documento = EXCLUDED.tipo_documento,
                           numero_documento = EXCLUDED.numero_documento,
                           celular = EXCLUDED.celular
             RETURNING {IDENTIFICATION_COLUMNS}"
        ))
        .bind(input.email.as_str())
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.document_type.code())
        .bind(input.document_number)
        .bind(input.phone)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a shipping address by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_shipping(
        &self,
        id: ShippingAddressId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingRow>(&format!(
            "SELECT {SHIPPING_COLUMNS} FROM envio WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ShippingAddress::try_from).transpose()
    }

    /// The user's active shipping address, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_shipping(
        &self,
        user_id: UserId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingRow>(&format!(
            "SELECT {SHIPPING_COLUMNS} FROM envio
             WHERE usuario_id = $1 AND activo
             ORDER BY fecha_actualizacion DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ShippingAddress::try_from).transpose()
    }

    /// All shipping addresses a user has saved, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_shipping_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShippingAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShippingRow>(&format!(
            "SELECT {SHIPPING_COLUMNS} FROM envio
             WHERE usuario_id = $1
             ORDER BY fecha_actualizacion DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShippingAddress::try_from).collect()
    }

    /// Save a shipping address as the active one.
    ///
    /// Deactivates the previous addresses of the same owner (user, or
    /// identification for guests) and inserts the new one in a single
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace_active_shipping(
        &self,
        user_id: Option<UserId>,
        identification_id: Option<IdentificationId>,
        input: ShippingInput<'_>,
    ) -> Result<ShippingAddress, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(user_id) = user_id {
            sqlx::query("UPDATE envio SET activo = FALSE WHERE usuario_id = $1 AND activo")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        } else if let Some(identification_id) = identification_id {
            sqlx::query(
                "UPDATE envio SET activo = FALSE WHERE identificacion_id = $1 AND activo",
            )
            .bind(identification_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, ShippingRow>(&format!(
            "INSERT INTO envio
                 (usuario_id, identificacion_id, departamento, municipio, tipo_direccion,
                  calle, letra, numero, barrio, piso, nombre_receptor, telefono_receptor,
                  empresa_envio, costo_envio, activo)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, TRUE)
             RETURNING {SHIPPING_COLUMNS}"
        ))
        .bind(user_id)
        .bind(identification_id)
        .bind(input.department)
        .bind(input.municipality)
        .bind(input.address_type)
        .bind(input.street)
        .bind(input.letter)
        .bind(input.number)
        .bind(input.neighborhood)
        .bind(input.floor)
        .bind(input.receiver_name)
        .bind(input.receiver_phone)
        .bind(input.carrier.code())
        .bind(input.cost)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Delete one of the user's saved addresses.
    ///
    /// Returns `false` when the address doesn't exist or belongs to
    /// someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_shipping_for_user(
        &self,
        id: ShippingAddressId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM envio WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark one of the user's saved addresses as the active one.
    ///
    /// Deactivates the rest in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to someone else.
    pub async fn activate_shipping_for_user(
        &self,
        id: ShippingAddressId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE envio SET activo = FALSE WHERE usuario_id = $1 AND activo")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE envio SET activo = TRUE WHERE id = $1 AND usuario_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    /// Process an approved payment for a cart.
    ///
    /// In one transaction: locks the cart, deducts stock for every line
    /// (failing the whole order if any variant is short), writes the
    /// order and its lines, and marks the cart completed. A cart that is
    /// already completed yields [`OrderOutcome::AlreadyCompleted`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Conflict` if any line has insufficient stock.
    pub async fn process_approved_payment(
        &self,
        cart_id: CartId,
        order: NewOrder,
    ) -> Result<OrderOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let completed: Option<bool> =
            sqlx::query_scalar("SELECT completado FROM carrito WHERE id = $1 FOR UPDATE")
                .bind(cart_id)
                .fetch_optional(&mut *tx)
                .await?;

        match completed {
            None => return Err(RepositoryError::NotFound),
            Some(true) => return Ok(OrderOutcome::AlreadyCompleted),
            Some(false) => {}
        }

        let lines = sqlx::query_as::<_, (VariantId, i32, Money, String)>(
            "SELECT ic.variante_id, ic.cantidad, ic.precio_unitario, p.referencia
             FROM item_carrito ic
             JOIN variante_producto v ON v.id = ic.variante_id
             JOIN producto p ON p.id = v.producto_id
             WHERE ic.carrito_id = $1
             ORDER BY ic.id",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        for (variant_id, quantity, _, reference) in &lines {
            let result = sqlx::query(
                "UPDATE variante_producto
                 SET stock = stock - $1
                 WHERE id = $2 AND stock >= $1",
            )
            .bind(quantity)
            .bind(variant_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "stock insuficiente para la referencia {reference}"
                )));
            }
        }

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO pedidos
                 (usuario_id, cliente, estado_pedido, metodo_pago, total, estado_pago,
                  external_reference, payment_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(&order.customer)
        .bind(OrderStatus::Processing.as_str())
        .bind(&order.payment_method)
        .bind(order.total)
        .bind(order.payment_status.as_str())
        .bind(&order.external_reference)
        .bind(order.payment_id.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for (variant_id, quantity, unit_price, _) in &lines {
            sqlx::query(
                "INSERT INTO item_pedido (pedido_id, variante_id, cantidad, precio_unitario)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_row.id)
            .bind(variant_id)
            .bind(quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carrito SET completado = TRUE WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OrderOutcome::Created(order_row.try_into()?))
    }

    /// Find an order by its Mercado Pago external reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_order_by_external_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pedidos WHERE external_reference = $1"
        ))
        .bind(external_reference)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Update the payment fields of an order after a gateway notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_order_payment(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
        payment_id: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE pedidos SET estado_pago = $1, payment_id = $2 WHERE id = $3")
                .bind(payment_status.as_str())
                .bind(payment_id)
                .bind(order_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_orders_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pedidos WHERE usuario_id = $1 ORDER BY fecha DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// One of the user's orders, or `None` when it isn't theirs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_order_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM pedidos WHERE id = $1 AND usuario_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// The lines of an order with product and variant names resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_order_lines(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT ip.id AS item_id, ip.variante_id AS variant_id,
                    p.nombre AS product_name, p.referencia AS reference,
                    t.nombre AS size_name, col.nombre AS color_name,
                    COALESCE(v.imagen, p.imagen) AS image,
                    ip.cantidad AS quantity, ip.precio_unitario AS unit_price
             FROM item_pedido ip
             JOIN variante_producto v ON v.id = ip.variante_id
             JOIN producto p ON p.id = v.producto_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color col ON col.id = v.color_id
             WHERE ip.pedido_id = $1
             ORDER BY ip.id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }
}
