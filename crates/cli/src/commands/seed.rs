//! Catalog seed data command.
//!
//! Reads a YAML file describing lookup values (categories, colors, sizes)
//! and products with their variants, then inserts anything not already
//! present. Existing rows are left alone, so re-running the command against
//! a populated database is safe.
//!
//! # Usage
//!
//! ```bash
//! liher-cli seed -f crates/cli/seed/catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use super::{CommandError, connect};

/// Errors that can occur while seeding the catalog.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Connection or environment error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Seed file cannot be read.
    #[error("Cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A variant references a size or color the file does not declare.
    #[error("Unknown {kind} '{name}' in product {reference}")]
    UnknownLookup {
        /// Lookup kind, `talla` or `color`.
        kind: &'static str,
        /// The undeclared value.
        name: String,
        /// Reference of the product whose variant failed.
        reference: String,
    },
}

/// Root of the seed file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    categorias: Vec<String>,
    #[serde(default)]
    colores: Vec<String>,
    #[serde(default)]
    tallas: Vec<String>,
    #[serde(default)]
    productos: Vec<SeedProduct>,
}

/// One product entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    referencia: String,
    nombre: String,
    precio: Decimal,
    categoria: Option<String>,
    descripcion: Option<String>,
    imagen: Option<String>,
    #[serde(default)]
    variantes: Vec<SeedVariant>,
}

/// One size/color variant of a product.
#[derive(Debug, Deserialize)]
struct SeedVariant {
    talla: String,
    color: String,
    #[serde(default)]
    stock: i32,
    imagen: Option<String>,
}

/// Counts reported at the end of a seed run.
#[derive(Debug, Default)]
struct SeedSummary {
    products_inserted: u32,
    products_skipped: u32,
    variants_inserted: u32,
}

/// Load catalog seed data from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a variant names
/// an undeclared size or color, or the database writes fail.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        categorias = seed.categorias.len(),
        colores = seed.colores.len(),
        tallas = seed.tallas.len(),
        productos = seed.productos.len(),
        "Parsed seed file"
    );

    let pool = connect().await?;

    insert_lookups(&pool, "categoria", &seed.categorias).await?;
    insert_lookups(&pool, "color", &seed.colores).await?;
    insert_lookups(&pool, "talla", &seed.tallas).await?;

    let mut summary = SeedSummary::default();
    for product in &seed.productos {
        insert_product(&pool, product, &mut summary).await?;
    }

    info!("Seeding complete");
    info!("  Products inserted: {}", summary.products_inserted);
    info!(
        "  Products skipped (already exist): {}",
        summary.products_skipped
    );
    info!("  Variants inserted: {}", summary.variants_inserted);

    Ok(())
}

/// Insert lookup values by name, leaving existing rows untouched.
async fn insert_lookups(pool: &PgPool, table: &str, names: &[String]) -> Result<(), SeedError> {
    // Table names come from this module, never from the seed file.
    let sql = format!("INSERT INTO {table} (nombre) VALUES ($1) ON CONFLICT (nombre) DO NOTHING");

    for name in names {
        sqlx::query(&sql).bind(name).execute(pool).await?;
    }
    Ok(())
}

/// Insert one product and its variants, skipping references that already exist.
async fn insert_product(
    pool: &PgPool,
    product: &SeedProduct,
    summary: &mut SeedSummary,
) -> Result<(), SeedError> {
    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM producto WHERE referencia = $1")
        .bind(&product.referencia)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        summary.products_skipped += 1;
        return Ok(());
    }

    let categoria_id = match &product.categoria {
        Some(nombre) => {
            let id = lookup_id(pool, "categoria", nombre).await?.ok_or_else(|| {
                SeedError::UnknownLookup {
                    kind: "categoria",
                    name: nombre.clone(),
                    reference: product.referencia.clone(),
                }
            })?;
            Some(id)
        }
        None => None,
    };

    let mut tx = pool.begin().await?;

    let product_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO producto (nombre, referencia, categoria_id, precio, descripcion, imagen)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(&product.nombre)
    .bind(&product.referencia)
    .bind(categoria_id)
    .bind(product.precio)
    .bind(&product.descripcion)
    .bind(&product.imagen)
    .fetch_one(&mut *tx)
    .await?;

    for variant in &product.variantes {
        let talla_id = lookup_id(pool, "talla", &variant.talla).await?.ok_or_else(|| {
            SeedError::UnknownLookup {
                kind: "talla",
                name: variant.talla.clone(),
                reference: product.referencia.clone(),
            }
        })?;
        let color_id = lookup_id(pool, "color", &variant.color).await?.ok_or_else(|| {
            SeedError::UnknownLookup {
                kind: "color",
                name: variant.color.clone(),
                reference: product.referencia.clone(),
            }
        })?;

        sqlx::query(
            r"
            INSERT INTO variante_producto (producto_id, talla_id, color_id, stock, imagen)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(product_id)
        .bind(talla_id)
        .bind(color_id)
        .bind(variant.stock)
        .bind(&variant.imagen)
        .execute(&mut *tx)
        .await?;

        summary.variants_inserted += 1;
    }

    tx.commit().await?;

    summary.products_inserted += 1;
    info!(
        referencia = %product.referencia,
        variantes = product.variantes.len(),
        "Inserted product"
    );
    Ok(())
}

/// Find a lookup row id by name.
async fn lookup_id(pool: &PgPool, table: &str, name: &str) -> Result<Option<i32>, SeedError> {
    let sql = format!("SELECT id FROM {table} WHERE nombre = $1");
    let id = sqlx::query_scalar(&sql).bind(name).fetch_optional(pool).await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_seed_file() {
        let yaml = r"
categorias:
  - Vestidos
colores:
  - Negro
  - Rojo
tallas:
  - S
  - M
productos:
  - referencia: VES-001
    nombre: Vestido largo
    precio: 185000
    categoria: Vestidos
    descripcion: Vestido largo de fiesta
    variantes:
      - talla: S
        color: Negro
        stock: 5
      - talla: M
        color: Rojo
";
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.categorias, vec!["Vestidos"]);
        assert_eq!(seed.productos.len(), 1);

        let product = &seed.productos[0];
        assert_eq!(product.referencia, "VES-001");
        assert_eq!(product.precio, Decimal::from(185_000));
        assert_eq!(product.variantes.len(), 2);
        assert_eq!(product.variantes[0].stock, 5);
        // Stock defaults to zero when omitted
        assert_eq!(product.variantes[1].stock, 0);
    }

    #[test]
    fn sections_are_optional() {
        let seed: SeedFile = serde_yaml::from_str("tallas:\n  - XL\n").unwrap();
        assert!(seed.categorias.is_empty());
        assert!(seed.productos.is_empty());
        assert_eq!(seed.tallas, vec!["XL"]);
    }
}
