//! Product and variant repository for the inventory and catalog sections.

use sqlx::PgPool;

use liher_core::{CategoryId, ColorId, Money, ProductId, SizeId, VariantId};

use super::RepositoryError;
use crate::models::catalog::ProductOverview;
use crate::models::inventory::{InventoryStats, LOW_STOCK_THRESHOLD, VariantStock};

/// Database row for `producto` with aggregated variant figures.
#[derive(Debug, sqlx::FromRow)]
struct ProductOverviewRow {
    id: ProductId,
    name: String,
    reference: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    price: Money,
    status: String,
    description: Option<String>,
    image: Option<String>,
    variant_count: i64,
    total_stock: i64,
}

impl TryFrom<ProductOverviewRow> for ProductOverview {
    type Error = RepositoryError;

    fn try_from(row: ProductOverviewRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown product status '{}'", row.status))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            reference: row.reference,
            category_id: row.category_id,
            category_name: row.category_name,
            price: row.price,
            status,
            description: row.description,
            image: row.image,
            variant_count: row.variant_count,
            total_stock: row.total_stock,
        })
    }
}

/// Database row for the variant-level inventory table.
#[derive(Debug, sqlx::FromRow)]
struct VariantStockRow {
    variant_id: VariantId,
    product_id: ProductId,
    product_name: String,
    reference: String,
    category_name: Option<String>,
    size_name: String,
    color_name: String,
    price: Money,
    stock: i32,
    active: bool,
}

impl From<VariantStockRow> for VariantStock {
    fn from(row: VariantStockRow) -> Self {
        Self {
            variant_id: row.variant_id,
            product_id: row.product_id,
            product_name: row.product_name,
            reference: row.reference,
            category_name: row.category_name,
            size_name: row.size_name,
            color_name: row.color_name,
            price: row.price,
            stock: row.stock,
            active: row.active,
        }
    }
}

const OVERVIEW_COLUMNS: &str = "p.id, p.nombre AS name, p.referencia AS reference, \
     p.categoria_id AS category_id, c.nombre AS category_name, p.precio AS price, \
     p.estado AS status, p.descripcion AS description, p.imagen AS image, \
     COUNT(v.id) AS variant_count, COALESCE(SUM(v.stock), 0) AS total_stock";

const OVERVIEW_JOINS: &str = "FROM producto p \
     LEFT JOIN categoria c ON c.id = p.categoria_id \
     LEFT JOIN variante_producto v ON v.producto_id = p.id";

const OVERVIEW_GROUP: &str = "GROUP BY p.id, c.nombre";

const VARIANT_COLUMNS: &str = "v.id AS variant_id, p.id AS product_id, \
     p.nombre AS product_name, p.referencia AS reference, c.nombre AS category_name, \
     t.nombre AS size_name, col.nombre AS color_name, p.precio AS price, \
     v.stock, v.activo AS active";

const VARIANT_JOINS: &str = "FROM variante_producto v \
     JOIN producto p ON p.id = v.producto_id \
     LEFT JOIN categoria c ON c.id = p.categoria_id \
     JOIN talla t ON t.id = v.talla_id \
     JOIN color col ON col.id = v.color_id";

/// Repository for product and variant management.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Product-level summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_overviews(&self) -> Result<Vec<ProductOverview>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductOverviewRow>(&format!(
            "SELECT {OVERVIEW_COLUMNS} {OVERVIEW_JOINS} {OVERVIEW_GROUP}
             ORDER BY p.fecha_creacion DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ProductOverview::try_from).collect()
    }

    /// One product's summary, for the edit form and the stock pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_overview(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductOverview>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductOverviewRow>(&format!(
            "SELECT {OVERVIEW_COLUMNS} {OVERVIEW_JOINS} WHERE p.id = $1 {OVERVIEW_GROUP}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductOverview::try_from).transpose()
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference is taken.
    pub async fn create(
        &self,
        reference: &str,
        name: &str,
        description: Option<&str>,
        category_id: Option<CategoryId>,
        price: Money,
        image: Option<&str>,
        status: &str,
    ) -> Result<ProductId, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO producto (referencia, nombre, descripcion, categoria_id, precio, imagen, estado)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(reference)
        .bind(name)
        .bind(description)
        .bind(category_id)
        .bind(price)
        .bind(image)
        .bind(status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "reference already exists"))?;

        Ok(id)
    }

    /// Update a product's editable fields. Stock is not among them;
    /// stock only moves through received entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference is taken,
    /// `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        reference: &str,
        name: &str,
        description: Option<&str>,
        category_id: Option<CategoryId>,
        price: Money,
        image: Option<&str>,
        status: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE producto
             SET referencia = $1, nombre = $2, descripcion = $3, categoria_id = $4,
                 precio = $5, imagen = COALESCE($6, imagen), estado = $7
             WHERE id = $8",
        )
        .bind(reference)
        .bind(name)
        .bind(description)
        .bind(category_id)
        .bind(price)
        .bind(image)
        .bind(status)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "reference already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a product and, via cascade, its variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order references one of
    /// its variants, `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM producto WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_sqlx_referenced(e, "product has variants referenced by orders")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Every variant with its product, for the inventory table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variants(&self) -> Result<Vec<VariantStock>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantStockRow>(&format!(
            "SELECT {VARIANT_COLUMNS} {VARIANT_JOINS}
             ORDER BY p.nombre, t.nombre, col.nombre"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(VariantStock::from).collect())
    }

    /// One product's variants, for the stock-entry form and the variant
    /// management rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantStock>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantStockRow>(&format!(
            "SELECT {VARIANT_COLUMNS} {VARIANT_JOINS}
             WHERE p.id = $1
             ORDER BY t.nombre, col.nombre"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(VariantStock::from).collect())
    }

    /// Create a size/color variant for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the combination exists.
    pub async fn create_variant(
        &self,
        product_id: ProductId,
        size_id: SizeId,
        color_id: ColorId,
        stock: i32,
        image: Option<&str>,
    ) -> Result<VariantId, RepositoryError> {
        let id: VariantId = sqlx::query_scalar(
            "INSERT INTO variante_producto (producto_id, talla_id, color_id, stock, imagen)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(product_id)
        .bind(size_id)
        .bind(color_id)
        .bind(stock)
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "variant combination already exists"))?;

        Ok(id)
    }

    /// Delete a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order references it
    /// (deactivate instead), `RepositoryError::NotFound` if it doesn't
    /// exist.
    pub async fn delete_variant(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM variante_producto WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx_referenced(e, "variant referenced by orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Header figures for the inventory page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<InventoryStats, RepositoryError> {
        let row: (i64, i64, Option<rust_decimal::Decimal>, i64, i64) = sqlx::query_as(
            "SELECT COUNT(DISTINCT v.producto_id),
                    COALESCE(SUM(v.stock), 0)::BIGINT,
                    SUM(p.precio * v.stock),
                    COUNT(*) FILTER (WHERE v.stock > 0 AND v.stock < $1),
                    COUNT(*) FILTER (WHERE v.stock = 0)
             FROM variante_producto v
             JOIN producto p ON p.id = v.producto_id",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        let (total_products, total_units, value, low_stock, out_of_stock) = row;
        Ok(InventoryStats {
            total_products,
            total_units,
            inventory_value: Money::new(value.unwrap_or_default()),
            low_stock,
            out_of_stock,
        })
    }
}
