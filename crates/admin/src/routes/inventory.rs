//! Inventory routes: the variant-level stock table, product and variant
//! CRUD, and received stock entries.
//!
//! Stock is never edited directly on a product or variant form; it only
//! moves through recorded entries so the movements view stays a faithful
//! history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use liher_core::{CategoryId, ColorId, Money, ProductId, SizeId, VariantId};

use crate::db::{
    LookupRepository, ProductRepository, RepositoryError, StockRepository,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::catalog::{LookupEntry, ProductOverview};
use crate::models::inventory::{InventoryStats, StockEntry, VariantStock};
use crate::models::{CurrentStaff, Section};
use crate::routes::{FlashQuery, redirect_error, redirect_success};
use crate::state::AppState;

// =============================================================================
// Inventory table
// =============================================================================

/// Inventory page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/list.html")]
pub struct InventoryTemplate {
    pub staff: CurrentStaff,
    pub variants: Vec<VariantStock>,
    pub stats: InventoryStats,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the variant-level inventory table with its header stats.
#[instrument(skip(state, staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let repo = ProductRepository::new(state.pool());
    let variants = repo.list_variants().await?;
    let stats = repo.stats().await?;

    Ok(InventoryTemplate {
        staff,
        variants,
        stats,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub referencia: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub categoria_id: String,
    #[serde(default)]
    pub precio: String,
    #[serde(default)]
    pub imagen: String,
    #[serde(default)]
    pub estado: String,
}

impl ProductForm {
    fn from_product(product: &ProductOverview) -> Self {
        Self {
            referencia: product.reference.clone(),
            nombre: product.name.clone(),
            descripcion: product.description.clone().unwrap_or_default(),
            categoria_id: product
                .category_id
                .map(|id| id.as_i32().to_string())
                .unwrap_or_default(),
            precio: product.price.amount().to_string(),
            imagen: product.image.clone().unwrap_or_default(),
            estado: product.status.as_str().to_string(),
        }
    }
}

/// Validated product fields ready for the repository.
#[derive(Debug)]
struct ParsedProduct {
    reference: String,
    name: String,
    description: Option<String>,
    category_id: Option<CategoryId>,
    price: Money,
    image: Option<String>,
    status: String,
}

fn parse_product_form(form: &ProductForm) -> std::result::Result<ParsedProduct, String> {
    let reference = form.referencia.trim().to_string();
    let name = form.nombre.trim().to_string();
    if reference.is_empty() || name.is_empty() {
        return Err("El nombre y la referencia son obligatorios.".to_string());
    }

    let price = form
        .precio
        .trim()
        .parse::<Decimal>()
        .ok()
        .filter(|p| p.is_sign_positive() && !p.is_zero())
        .ok_or_else(|| "El precio debe ser un número mayor que cero.".to_string())?;

    let category_id = match form.categoria_id.trim() {
        "" => None,
        raw => Some(
            raw.parse::<i32>()
                .map(CategoryId::new)
                .map_err(|_| "Categoría inválida.".to_string())?,
        ),
    };

    let description = Some(form.descripcion.trim().to_string()).filter(|d| !d.is_empty());
    let image = Some(form.imagen.trim().to_string()).filter(|i| !i.is_empty());
    let status = match form.estado.trim() {
        "" | "Activo" => "Activo".to_string(),
        "Inactivo" => "Inactivo".to_string(),
        _ => return Err("Estado inválido.".to_string()),
    };

    Ok(ParsedProduct {
        reference,
        name,
        description,
        category_id,
        price: price.into(),
        image,
        status,
    })
}

/// Product form template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/product_form.html")]
pub struct ProductFormTemplate {
    pub staff: CurrentStaff,
    /// `Some` when editing; carries the id and the variant rows.
    pub product: Option<ProductOverview>,
    pub variants: Vec<VariantStock>,
    pub categories: Vec<LookupEntry>,
    pub form: ProductForm,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the empty product form.
#[instrument(skip(state, staff))]
pub async fn product_create_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let categories = LookupRepository::new(state.pool()).list_categories().await?;

    Ok(ProductFormTemplate {
        staff,
        product: None,
        variants: Vec::new(),
        categories,
        form: ProductForm::default(),
        error: None,
        success: None,
        warning: None,
    }
    .into_response())
}

/// Handle the new-product form.
#[instrument(skip(state, staff, form))]
pub async fn product_create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let lookups = LookupRepository::new(state.pool());
    let render_error = |message: String, categories: Vec<LookupEntry>| {
        ProductFormTemplate {
            staff: staff.clone(),
            product: None,
            variants: Vec::new(),
            categories,
            form: form.clone(),
            error: Some(message),
            success: None,
            warning: None,
        }
        .into_response()
    };

    let parsed = match parse_product_form(&form) {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(render_error(message, lookups.list_categories().await?));
        }
    };

    let repo = ProductRepository::new(state.pool());
    match repo
        .create(
            &parsed.reference,
            &parsed.name,
            parsed.description.as_deref(),
            parsed.category_id,
            parsed.price,
            parsed.image.as_deref(),
            &parsed.status,
        )
        .await
    {
        Ok(id) => {
            tracing::info!(product_id = %id, "Product created");
            Ok(redirect_success(
                "/inventario",
                "Producto añadido exitosamente al inventario.",
            )
            .into_response())
        }
        Err(RepositoryError::Conflict(_)) => Ok(render_error(
            "Ya existe un producto con esa referencia.".to_string(),
            lookups.list_categories().await?,
        )),
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form for a product, with its variant rows.
#[instrument(skip(state, staff))]
pub async fn product_edit_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let repo = ProductRepository::new(state.pool());
    let product_id = ProductId::new(id);
    let product = repo
        .get_overview(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {id}")))?;
    let variants = repo.list_variants_for_product(product_id).await?;
    let categories = LookupRepository::new(state.pool()).list_categories().await?;

    let form = ProductForm::from_product(&product);
    Ok(ProductFormTemplate {
        staff,
        product: Some(product),
        variants,
        categories,
        form,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

/// Handle the edit-product form.
#[instrument(skip(state, staff, form))]
pub async fn product_edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let product_id = ProductId::new(id);
    let edit_path = format!("/inventario/productos/editar/{id}");

    let parsed = match parse_product_form(&form) {
        Ok(parsed) => parsed,
        Err(message) => return Ok(redirect_error(&edit_path, &message).into_response()),
    };

    let repo = ProductRepository::new(state.pool());
    match repo
        .update(
            product_id,
            &parsed.reference,
            &parsed.name,
            parsed.description.as_deref(),
            parsed.category_id,
            parsed.price,
            parsed.image.as_deref(),
            &parsed.status,
        )
        .await
    {
        Ok(()) => Ok(redirect_success("/inventario", "Producto actualizado.").into_response()),
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            &edit_path,
            "Ya existe un producto con esa referencia.",
        )
        .into_response()),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("producto {id}")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product (and via cascade its variants).
#[instrument(skip(state, staff))]
pub async fn product_delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    match ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(product_id = id, "Product deleted");
            Ok(redirect_success("/inventario", "Producto eliminado.").into_response())
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            "/inventario",
            "No se puede eliminar: el producto tiene pedidos asociados.",
        )
        .into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("producto {id}"))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Variants
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantForm {
    #[serde(default)]
    pub talla_id: String,
    #[serde(default)]
    pub color_id: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub imagen: String,
}

/// Variant form template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/variant_form.html")]
pub struct VariantFormTemplate {
    pub staff: CurrentStaff,
    pub product: ProductOverview,
    pub sizes: Vec<LookupEntry>,
    pub colors: Vec<LookupEntry>,
    pub form: VariantForm,
    pub error: Option<String>,
}

/// Display the new-variant form for a product.
#[instrument(skip(state, staff))]
pub async fn variant_create_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(producto_id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let product = ProductRepository::new(state.pool())
        .get_overview(ProductId::new(producto_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {producto_id}")))?;

    let lookups = LookupRepository::new(state.pool());
    Ok(VariantFormTemplate {
        staff,
        product,
        sizes: lookups.list_sizes().await?,
        colors: lookups.list_colors().await?,
        form: VariantForm::default(),
        error: None,
    }
    .into_response())
}

/// Handle the new-variant form.
#[instrument(skip(state, staff, form))]
pub async fn variant_create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(producto_id): Path<i32>,
    Form(form): Form<VariantForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let product_id = ProductId::new(producto_id);
    let edit_path = format!("/inventario/productos/editar/{producto_id}");

    let (Ok(size_id), Ok(color_id)) = (
        form.talla_id.trim().parse::<i32>(),
        form.color_id.trim().parse::<i32>(),
    ) else {
        return Ok(redirect_error(&edit_path, "Selecciona una talla y un color.").into_response());
    };

    let stock = match form.stock.trim() {
        "" => 0,
        raw => match raw.parse::<i32>() {
            Ok(n) if n >= 0 => n,
            _ => {
                return Ok(redirect_error(
                    &edit_path,
                    "El stock inicial debe ser un número mayor o igual a cero.",
                )
                .into_response());
            }
        },
    };
    let image = Some(form.imagen.trim().to_string()).filter(|i| !i.is_empty());

    match ProductRepository::new(state.pool())
        .create_variant(
            product_id,
            SizeId::new(size_id),
            ColorId::new(color_id),
            stock,
            image.as_deref(),
        )
        .await
    {
        Ok(id) => {
            tracing::info!(variant_id = %id, product_id = producto_id, "Variant created");
            Ok(redirect_success(&edit_path, "Variante agregada.").into_response())
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            &edit_path,
            "Ya existe una variante con esa talla y color.",
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct VariantDeleteForm {
    pub producto_id: i32,
}

/// Delete a variant; the form carries the product id for the redirect.
#[instrument(skip(state, staff))]
pub async fn variant_delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<VariantDeleteForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let edit_path = format!("/inventario/productos/editar/{}", form.producto_id);
    match ProductRepository::new(state.pool())
        .delete_variant(VariantId::new(id))
        .await
    {
        Ok(()) => Ok(redirect_success(&edit_path, "Variante eliminada.").into_response()),
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            &edit_path,
            "No se puede eliminar: la variante tiene pedidos asociados.",
        )
        .into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("variante {id}"))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Stock entries
// =============================================================================

/// Stock entry form template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/stock_form.html")]
pub struct StockFormTemplate {
    pub staff: CurrentStaff,
    pub product: ProductOverview,
    pub variants: Vec<VariantStock>,
    pub error: Option<String>,
}

/// Display the stock entry form over a product's variants.
#[instrument(skip(state, staff))]
pub async fn stock_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(producto_id): Path<i32>,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let repo = ProductRepository::new(state.pool());
    let product_id = ProductId::new(producto_id);
    let product = repo
        .get_overview(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {producto_id}")))?;
    let variants = repo.list_variants_for_product(product_id).await?;

    if variants.is_empty() {
        let message = format!(
            "El producto '{}' no tiene variantes de inventario.",
            product.name
        );
        return Ok(redirect_error("/inventario", &message).into_response());
    }

    Ok(StockFormTemplate {
        staff,
        product,
        variants,
        error: query.error,
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct StockEntryForm {
    #[serde(default)]
    pub producto_id: String,
    #[serde(default)]
    pub variante_id: String,
    #[serde(default)]
    pub cantidad_ingreso: String,
}

/// Record a stock entry: bump the variant's stock and log the movement
/// in one transaction.
#[instrument(skip(state, staff, form))]
pub async fn stock_entry(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<StockEntryForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let Ok(producto_id) = form.producto_id.trim().parse::<i32>() else {
        return Ok(redirect_error("/inventario", "Producto inválido.").into_response());
    };
    let stock_path = format!("/inventario/stock/{producto_id}");

    let Ok(variante_id) = form.variante_id.trim().parse::<i32>() else {
        return Ok(redirect_error(&stock_path, "Selecciona una variante.").into_response());
    };
    let Ok(cantidad) = form.cantidad_ingreso.trim().parse::<i32>() else {
        return Ok(redirect_error(
            &stock_path,
            "La cantidad de ingreso debe ser un número entero.",
        )
        .into_response());
    };
    if cantidad <= 0 {
        return Ok(
            redirect_error(&stock_path, "La cantidad debe ser mayor que cero.").into_response(),
        );
    }

    let variant_id = VariantId::new(variante_id);
    let new_stock = match StockRepository::new(state.pool())
        .record_entry(variant_id, cantidad)
        .await
    {
        Ok(stock) => stock,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("variante {variante_id}")));
        }
        Err(e) => return Err(e.into()),
    };

    let label = ProductRepository::new(state.pool())
        .list_variants_for_product(ProductId::new(producto_id))
        .await?
        .into_iter()
        .find(|v| v.variant_id == variant_id)
        .map_or_else(|| format!("#{variante_id}"), |v| v.variant_label());

    tracing::info!(
        variant_id = variante_id,
        quantity = cantidad,
        new_stock,
        "Stock entry recorded"
    );

    let message = format!(
        "¡Entrada registrada! Se añadieron {cantidad} unidades a la variante {label}. Stock actual: {new_stock}."
    );
    Ok(redirect_success(
        &format!("/inventario/movimientos/{producto_id}"),
        &message,
    )
    .into_response())
}

/// Movements page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/movements.html")]
pub struct MovementsTemplate {
    pub staff: CurrentStaff,
    pub product: ProductOverview,
    pub entries: Vec<StockEntry>,
    pub success: Option<String>,
}

/// Display a product's stock entry history, newest first.
#[instrument(skip(state, staff))]
pub async fn movements(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(producto_id): Path<i32>,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Inventario)?;

    let product_id = ProductId::new(producto_id);
    let product = ProductRepository::new(state.pool())
        .get_overview(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {producto_id}")))?;
    let entries = StockRepository::new(state.pool())
        .entries_for_product(product_id)
        .await?;

    Ok(MovementsTemplate {
        staff,
        product,
        entries,
        success: query.success,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(referencia: &str, nombre: &str, precio: &str) -> ProductForm {
        ProductForm {
            referencia: referencia.to_string(),
            nombre: nombre.to_string(),
            precio: precio.to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn parse_product_form_requires_name_and_reference() {
        let err = parse_product_form(&form("", "Blusa", "45000")).unwrap_err();
        assert!(err.contains("obligatorios"));
    }

    #[test]
    fn parse_product_form_rejects_bad_price() {
        assert!(parse_product_form(&form("BL-1", "Blusa", "")).is_err());
        assert!(parse_product_form(&form("BL-1", "Blusa", "0")).is_err());
        assert!(parse_product_form(&form("BL-1", "Blusa", "-5")).is_err());
        assert!(parse_product_form(&form("BL-1", "Blusa", "gratis")).is_err());
    }

    #[test]
    fn parse_product_form_accepts_valid_input() {
        let mut input = form("BL-1", "Blusa", "45000");
        input.categoria_id = "3".to_string();
        input.estado = "Inactivo".to_string();
        let parsed = parse_product_form(&input).unwrap();
        assert_eq!(parsed.reference, "BL-1");
        assert_eq!(parsed.category_id, Some(CategoryId::new(3)));
        assert_eq!(parsed.status, "Inactivo");
        assert_eq!(parsed.price, Money::from_pesos(45_000));
    }

    #[test]
    fn parse_product_form_defaults_status_to_active() {
        let parsed = parse_product_form(&form("BL-1", "Blusa", "45000")).unwrap();
        assert_eq!(parsed.status, "Activo");
        assert_eq!(parsed.category_id, None);
    }
}
