//! Catalog route handlers: product listing with filters and the detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use liher_core::ProductId;

use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::catalog::{Category, Color, Product, Size, VariantOption};
use crate::models::session::CurrentUser;
use crate::state::AppState;

/// Filter query parameters for the product listing.
///
/// Blank values are treated as "no filter" so submitting the filter form
/// with empty selects behaves like clearing them.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub categoria: Option<String>,
    pub color: Option<String>,
    pub talla: Option<String>,
    pub warning: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/products.html")]
pub struct ProductsTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub colors: Vec<Color>,
    pub sizes: Vec<Size>,
    pub selected_category: String,
    pub selected_color: String,
    pub selected_size: String,
    pub warning: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product_detail.html")]
pub struct ProductDetailTemplate {
    pub user: Option<CurrentUser>,
    pub product: Product,
    pub variants: Vec<VariantOption>,
}

/// Normalize a filter value: trimmed, `None` when blank.
fn filter_value(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Display the product listing with category, color and size filters.
#[instrument(skip(state, user))]
pub async fn products(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let repo = CatalogRepository::new(state.pool());

    let category = filter_value(query.categoria.as_ref());
    let color = filter_value(query.color.as_ref());
    let size = filter_value(query.talla.as_ref());

    let products = repo
        .list_active_products(category.as_deref(), color.as_deref(), size.as_deref())
        .await?;
    let categories = repo.list_categories().await?;
    let colors = repo.list_colors().await?;
    let sizes = repo.list_sizes().await?;

    Ok(ProductsTemplate {
        user,
        products,
        categories,
        colors,
        sizes,
        selected_category: category.unwrap_or_default(),
        selected_color: color.unwrap_or_default(),
        selected_size: size.unwrap_or_default(),
        warning: query.warning,
    })
}

/// Display a product with its active variants.
#[instrument(skip(state, user))]
pub async fn product_detail(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let repo = CatalogRepository::new(state.pool());
    let product_id = ProductId::new(id);

    let product = repo
        .get_active_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {id}")))?;

    let variants = repo.list_variants(product_id).await?;

    Ok(ProductDetailTemplate {
        user,
        product,
        variants,
    })
}
