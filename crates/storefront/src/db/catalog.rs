//! Catalog repository: products, variants and the lookup tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use liher_core::{CategoryId, ColorId, Money, ProductId, SizeId, VariantId};

use super::RepositoryError;
use crate::models::catalog::{
    Category, Color, Product, Size, VariantOption, VariantWithProduct,
};

/// Database row for `producto` joined with its category name.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    reference: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    price: Money,
    description: Option<String>,
    image: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
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
            description: row.description,
            image: row.image,
            status,
            created_at: row.created_at,
        })
    }
}

/// Database row for `variante_producto` with lookup names resolved.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: VariantId,
    product_id: ProductId,
    size_id: SizeId,
    size_name: String,
    color_id: ColorId,
    color_name: String,
    image: Option<String>,
    stock: i32,
    active: bool,
}

impl From<VariantRow> for VariantOption {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            size_id: row.size_id,
            size_name: row.size_name,
            color_id: row.color_id,
            color_name: row.color_name,
            image: row.image,
            stock: row.stock,
            active: row.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantWithProductRow {
    variant_id: VariantId,
    product_id: ProductId,
    product_name: String,
    reference: String,
    price: Money,
    size_name: String,
    color_name: String,
    image: Option<String>,
    stock: i32,
    active: bool,
}

impl From<VariantWithProductRow> for VariantWithProduct {
    fn from(row: VariantWithProductRow) -> Self {
        Self {
            variant_id: row.variant_id,
            product_id: row.product_id,
            product_name: row.product_name,
            reference: row.reference,
            price: row.price,
            size_name: row.size_name,
            color_name: row.color_name,
            image: row.image,
            stock: row.stock,
            active: row.active,
        }
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.nombre AS name, p.referencia AS reference, \
     p.categoria_id AS category_id, c.nombre AS category_name, p.precio AS price, \
     p.descripcion AS description, p.imagen AS image, p.estado AS status, \
     p.fecha_creacion AS created_at";

/// Repository for catalog reads on the storefront.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, for the filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, (CategoryId, String)>(
            "SELECT id, nombre FROM categoria ORDER BY nombre",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id, name })
            .collect())
    }

    /// All colors, for the filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_colors(&self) -> Result<Vec<Color>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, (ColorId, String)>("SELECT id, nombre FROM color ORDER BY nombre")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Color { id, name })
            .collect())
    }

    /// All sizes, for the filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_sizes(&self) -> Result<Vec<Size>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, (SizeId, String)>("SELECT id, nombre FROM talla ORDER BY nombre")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Size { id, name })
            .collect())
    }

    /// Active products, newest first, optionally filtered by category,
    /// color and size names.
    ///
    /// Color and size filters match products having at least one active
    /// variant in that color/size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on an unknown status value.
    pub async fn list_active_products(
        &self,
        category: Option<&str>,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM producto p
             LEFT JOIN categoria c ON c.id = p.categoria_id
             WHERE p.estado = 'Activo'
               AND ($1::text IS NULL OR c.nombre = $1)
               AND ($2::text IS NULL OR EXISTS (
                     SELECT 1 FROM variante_producto v
                     JOIN color col ON col.id = v.color_id
                     WHERE v.producto_id = p.id AND v.activo AND col.nombre = $2))
               AND ($3::text IS NULL OR EXISTS (
                     SELECT 1 FROM variante_producto v
                     JOIN talla t ON t.id = v.talla_id
                     WHERE v.producto_id = p.id AND v.activo AND t.nombre = $3))
             ORDER BY p.fecha_creacion DESC"
        ))
        .bind(category)
        .bind(color)
        .bind(size)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// An active product by id, or `None` when missing or inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on an unknown status value.
    pub async fn get_active_product(
        &self,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM producto p
             LEFT JOIN categoria c ON c.id = p.categoria_id
             WHERE p.id = $1 AND p.estado = 'Activo'"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Active variants of a product with size and color names, ordered by
    /// size then color.
    ///
    /// The variant image falls back to the product image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantOption>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            "SELECT v.id, v.producto_id AS product_id,
                    v.talla_id AS size_id, t.nombre AS size_name,
                    v.color_id AS color_id, col.nombre AS color_name,
                    COALESCE(v.imagen, p.imagen) AS image,
                    v.stock, v.activo AS active
             FROM variante_producto v
             JOIN talla t ON t.id = v.talla_id
             JOIN color col ON col.id = v.color_id
             JOIN producto p ON p.id = v.producto_id
             WHERE v.producto_id = $1 AND v.activo
             ORDER BY t.nombre, col.nombre",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(VariantOption::from).collect())
    }

    /// A variant joined with the product fields the cart needs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variant_with_product(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantWithProduct>, RepositoryError> {
        let row = sqlx::query_as::<_, VariantWithProductRow>(
            "SELECT v.id AS variant_id, p.id AS product_id,
                    p.nombre AS product_name, p.referencia AS reference,
                    p.precio AS price,
                    t.nombre AS size_name, col.nombre AS color_name,
                    COALESCE(v.imagen, p.imagen) AS image,
                    v.stock, v.activo AS active
             FROM variante_producto v
             JOIN producto p ON p.id = v.producto_id
             JOIN talla t ON t.id = v.talla_id
             JOIN color col ON col.id = v.color_id
             WHERE v.id = $1",
        )
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(VariantWithProduct::from))
    }
}
