//! Cart route handlers.
//!
//! The cart page is server-rendered; mutations answer JSON consumed by
//! the page scripts: `success`, `message`, `total_items`, `total_precio`.
//! Guests keep their cart id in the session; logged-in users own theirs
//! by user id.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use liher_core::{CartId, CartItemId, Money, VariantId};

use crate::db::carts::CartRepository;
use crate::db::catalog::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::cart::{Cart, CartLine, subtotal};
use crate::models::session::{CurrentUser, keys};
use crate::state::AppState;

/// JSON body for the add endpoint. Missing or malformed bodies fall back
/// to one unit.
#[derive(Debug, Deserialize)]
pub struct AddToCartBody {
    pub cantidad: Option<i32>,
}

/// Form body for the quantity update endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub cantidad: i32,
}

/// JSON answer for a successful cart mutation.
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub success: bool,
    pub message: String,
    pub total_items: i64,
    pub total_precio: f64,
}

/// JSON answer for a rejected cart mutation.
#[derive(Debug, Serialize)]
pub struct CartRejection {
    pub success: bool,
    pub message: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/cart.html")]
pub struct CartTemplate {
    pub user: Option<CurrentUser>,
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub error: Option<String>,
}

/// Resolve the cart for this request.
///
/// Logged-in users get their open cart, creating one on first use.
/// Guests keep the cart id in the session; a stale or completed id is
/// replaced with a fresh cart.
pub async fn resolve_cart(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<Cart> {
    let repo = CartRepository::new(state.pool());

    if let Some(user) = user {
        if let Some(cart) = repo.find_open_for_user(user.id).await? {
            return Ok(cart);
        }
        return Ok(repo.create(Some(user.id)).await?);
    }

    if let Some(cart_id) = session.get::<CartId>(keys::CART_ID).await.ok().flatten() {
        if let Some(cart) = repo.get(cart_id).await? {
            if !cart.completed {
                return Ok(cart);
            }
        }
    }

    let cart = repo.create(None).await?;
    if let Err(e) = session.insert(keys::CART_ID, cart.id).await {
        tracing::error!("Failed to save cart id to session: {e}");
    }

    Ok(cart)
}

/// Current item count and subtotal of a cart, for mutation answers.
async fn cart_totals(repo: &CartRepository<'_>, cart_id: CartId) -> Result<(i64, Money)> {
    let lines = repo.list_lines(cart_id).await?;
    let total_items: i64 = lines.iter().map(|line| i64::from(line.quantity)).sum();
    Ok((total_items, subtotal(&lines)))
}

fn mutation_response(message: String, total_items: i64, total_precio: Money) -> Response {
    Json(CartMutationResponse {
        success: true,
        message,
        total_items,
        total_precio: total_precio.to_f64(),
    })
    .into_response()
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(CartRejection {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Error query parameters redirected onto the cart page.
#[derive(Debug, Deserialize)]
pub struct CartPageQuery {
    pub error: Option<String>,
}

/// Display the cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    axum::extract::Query(query): axum::extract::Query<CartPageQuery>,
) -> Result<impl IntoResponse> {
    let cart = resolve_cart(&state, &session, user.as_ref()).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    let subtotal = subtotal(&lines);

    Ok(CartTemplate {
        user,
        lines,
        subtotal,
        error: query.error,
    })
}

/// Add units of a variant to the cart.
///
/// Merges into an existing line for the same variant; a new line captures
/// the product's current price as `precio_unitario`.
#[instrument(skip(state, session, user, body))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(variant_id): Path<i32>,
    body: Option<Json<AddToCartBody>>,
) -> Result<Response> {
    let variant_id = VariantId::new(variant_id);
    let quantity = body.and_then(|Json(b)| b.cantidad).unwrap_or(1);

    let Some(variant) = CatalogRepository::new(state.pool())
        .get_variant_with_product(variant_id)
        .await?
    else {
        return Ok(rejection(
            StatusCode::NOT_FOUND,
            "El producto no existe o está agotado.",
        ));
    };
    if !variant.active {
        return Ok(rejection(
            StatusCode::NOT_FOUND,
            "El producto no existe o está agotado.",
        ));
    }

    if quantity <= 0 {
        return Ok(rejection(
            StatusCode::OK,
            "La cantidad debe ser un número positivo.",
        ));
    }
    if quantity > variant.stock {
        return Ok(rejection(
            StatusCode::OK,
            &format!(
                "Solo hay {} unidades disponibles en stock.",
                variant.stock
            ),
        ));
    }

    let cart = resolve_cart(&state, &session, user.as_ref()).await?;
    let repo = CartRepository::new(state.pool());

    let merged = repo.get_quantity(cart.id, variant_id).await?.is_some();
    repo.add_item(cart.id, variant_id, quantity, variant.price)
        .await?;

    let message = if merged {
        format!(
            "Se han añadido {} unidades más de \"{}\" al carrito.",
            quantity, variant.product_name
        )
    } else {
        format!(
            "El producto \"{}\" se ha añadido al carrito.",
            variant.product_name
        )
    };

    let (total_items, total_precio) = cart_totals(&repo, cart.id).await?;
    Ok(mutation_response(message, total_items, total_precio))
}

/// Set the quantity of a cart line; zero or less removes it.
#[instrument(skip(state, session, user, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(item_id): Path<i32>,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let item_id = CartItemId::new(item_id);
    let cart = resolve_cart(&state, &session, user.as_ref()).await?;
    let repo = CartRepository::new(state.pool());

    if repo.get_item(cart.id, item_id).await?.is_none() {
        return Ok(rejection(
            StatusCode::NOT_FOUND,
            "El producto no existe en el carrito.",
        ));
    }

    let message = if form.cantidad > 0 {
        repo.set_quantity(cart.id, item_id, form.cantidad).await?;
        "La cantidad del producto ha sido actualizada."
    } else {
        repo.remove_item(cart.id, item_id).await?;
        "El producto ha sido eliminado del carrito."
    };

    let (total_items, total_precio) = cart_totals(&repo, cart.id).await?;
    Ok(mutation_response(
        message.to_string(),
        total_items,
        total_precio,
    ))
}

/// Remove a line from the cart.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(item_id): Path<i32>,
) -> Result<Response> {
    let item_id = CartItemId::new(item_id);
    let cart = resolve_cart(&state, &session, user.as_ref()).await?;
    let repo = CartRepository::new(state.pool());

    if !repo.remove_item(cart.id, item_id).await? {
        return Ok(rejection(
            StatusCode::NOT_FOUND,
            "El producto no existe en el carrito.",
        ));
    }

    let (total_items, total_precio) = cart_totals(&repo, cart.id).await?;
    Ok(mutation_response(
        "El producto ha sido eliminado del carrito.".to_string(),
        total_items,
        total_precio,
    ))
}

/// Remove every line from the cart.
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = resolve_cart(&state, &session, user.as_ref()).await?;
    CartRepository::new(state.pool()).clear(cart.id).await?;

    Ok(mutation_response(
        "El carrito ha sido vaciado.".to_string(),
        0,
        Money::ZERO,
    ))
}
