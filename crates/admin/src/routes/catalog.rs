//! Catalog routes: the product-level summary and the three lookup
//! tables (categories, colors, sizes).
//!
//! Lookup names are case-insensitively unique. Deleting a category
//! leaves its products uncategorized; colors and sizes referenced by
//! variants cannot be deleted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use liher_core::{CategoryId, ColorId, SizeId};

use crate::db::{LookupRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::catalog::{LookupEntry, ProductOverview};
use crate::models::{CurrentStaff, Section};
use crate::routes::{FlashQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub staff: CurrentStaff,
    pub products: Vec<ProductOverview>,
    pub categories: Vec<LookupEntry>,
    pub colors: Vec<LookupEntry>,
    pub sizes: Vec<LookupEntry>,
    pub total_products: usize,
    pub total_variants: i64,
    pub active_products: usize,
    pub inactive_products: usize,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the product summary and the three lookup tables.
#[instrument(skip(state, staff))]
pub async fn overview(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;

    let products = ProductRepository::new(state.pool()).list_overviews().await?;
    let lookups = LookupRepository::new(state.pool());
    let categories = lookups.list_categories().await?;
    let colors = lookups.list_colors().await?;
    let sizes = lookups.list_sizes().await?;

    let total_products = products.len();
    let total_variants = products.iter().map(|p| p.variant_count).sum();
    let active_products = products.iter().filter(|p| p.has_stock()).count();
    let inactive_products = total_products - active_products;

    Ok(CatalogTemplate {
        staff,
        products,
        categories,
        colors,
        sizes,
        total_products,
        total_variants,
        active_products,
        inactive_products,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub nombre: String,
}

fn lookup_name(form: &LookupForm) -> std::result::Result<&str, Response> {
    let name = form.nombre.trim();
    if name.is_empty() {
        Err(redirect_error("/catalogo", "El nombre es obligatorio.").into_response())
    } else {
        Ok(name)
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Add a category.
#[instrument(skip(state, staff, form))]
pub async fn category_add(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool()).create_category(name).await {
        Ok(()) => Ok(redirect_success("/catalogo", "Categoría agregada.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Esta categoría ya existe.").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Rename a category.
#[instrument(skip(state, staff, form))]
pub async fn category_edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool())
        .rename_category(CategoryId::new(id), name)
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Categoría actualizada.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Esta categoría ya existe.").into_response())
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("categoría {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a category. Its products stay, uncategorized.
#[instrument(skip(state, staff))]
pub async fn category_delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;

    match LookupRepository::new(state.pool())
        .delete_category(CategoryId::new(id))
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Categoría eliminada.").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("categoría {id}"))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Colors
// =============================================================================

/// Add a color.
#[instrument(skip(state, staff, form))]
pub async fn color_add(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool()).create_color(name).await {
        Ok(()) => Ok(redirect_success("/catalogo", "Color agregado.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Este color ya existe.").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Rename a color.
#[instrument(skip(state, staff, form))]
pub async fn color_edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool())
        .rename_color(ColorId::new(id), name)
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Color actualizado.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Este color ya existe.").into_response())
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("color {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a color, unless variants use it.
#[instrument(skip(state, staff))]
pub async fn color_delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;

    match LookupRepository::new(state.pool())
        .delete_color(ColorId::new(id))
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Color eliminado.").into_response()),
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            "/catalogo",
            "No se puede eliminar: hay variantes usando este color.",
        )
        .into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("color {id}"))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Sizes
// =============================================================================

/// Add a size.
#[instrument(skip(state, staff, form))]
pub async fn size_add(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool()).create_size(name).await {
        Ok(()) => Ok(redirect_success("/catalogo", "Talla agregada.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Esta talla ya existe.").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Rename a size.
#[instrument(skip(state, staff, form))]
pub async fn size_edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;
    let name = match lookup_name(&form) {
        Ok(name) => name,
        Err(response) => return Ok(response),
    };

    match LookupRepository::new(state.pool())
        .rename_size(SizeId::new(id), name)
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Talla actualizada.").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/catalogo", "Esta talla ya existe.").into_response())
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("talla {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a size, unless variants use it.
#[instrument(skip(state, staff))]
pub async fn size_delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Catalogo)?;

    match LookupRepository::new(state.pool())
        .delete_size(SizeId::new(id))
        .await
    {
        Ok(()) => Ok(redirect_success("/catalogo", "Talla eliminada.").into_response()),
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            "/catalogo",
            "No se puede eliminar: hay variantes usando esta talla.",
        )
        .into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("talla {id}"))),
        Err(e) => Err(e.into()),
    }
}
