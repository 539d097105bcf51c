//! Admin panel route handlers.
//!
//! Every route except `/login` requires a staff session; module pages
//! additionally check the signed-in admin's permission flag for that
//! section and bounce to `/panel` with a warning when it is missing.
//!
//! # URL map
//!
//! ## Session
//! - `GET/POST /login` - staff login
//! - `GET  /logout` - logout
//! - `GET  /panel` - dashboard with one card per permitted section
//!
//! ## Inventory
//! - `GET  /inventario` - variant-level stock table with totals
//! - `GET/POST /inventario/productos/crear` - new product
//! - `GET/POST /inventario/productos/editar/{id}` - edit product
//! - `POST /inventario/productos/eliminar/{id}` - delete product
//! - `GET/POST /inventario/variantes/crear/{producto_id}` - new variant
//! - `POST /inventario/variantes/eliminar/{id}` - delete variant
//! - `GET  /inventario/stock/{producto_id}` - stock entry form
//! - `POST /inventario/stock` - record an entry and bump stock
//! - `GET  /inventario/movimientos/{producto_id}` - entry history
//!
//! ## Catalog lookups
//! - `GET  /catalogo` - product summary plus category/color/size tables
//! - `POST /catalogo/categorias/agregar|editar/{id}|eliminar/{id}`
//! - `POST /catalogo/colores/agregar|editar/{id}|eliminar/{id}`
//! - `POST /catalogo/tallas/agregar|editar/{id}|eliminar/{id}`
//!
//! ## Orders
//! - `GET  /pedidos` - all orders, newest first
//! - `GET  /pedidos/{id}` - order detail with lines
//!
//! ## Users
//! - `GET  /usuarios` - user table with active/inactive counts
//! - `POST /usuarios/crear` - create from the modal (JSON)
//! - `POST /usuarios/editar/{id}` - edit from the modal (form + JSON permisos)
//! - `GET  /usuarios/ver/{id}` - detail card (JSON)
//! - `GET  /usuarios/obtener/{id}` - edit-form prefill (JSON)
//! - `POST /usuarios/toggle/{id}` - flip is_active (JSON)
//!
//! ## Requests and returns
//! - `GET  /peticiones` - pending product requests
//! - `POST /peticiones/atender/{id}` - mark attended
//! - `GET  /devoluciones` - placeholder page

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod requests;
pub mod returns;
pub mod users;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Flash message query parameters shared by the HTML pages.
#[derive(Debug, Deserialize)]
pub struct FlashQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Redirect to `path` with an error flash in the query string.
pub fn redirect_error(path: &str, message: &str) -> Redirect {
    flash_redirect(path, "error", message)
}

/// Redirect to `path` with a success flash in the query string.
pub fn redirect_success(path: &str, message: &str) -> Redirect {
    flash_redirect(path, "success", message)
}

fn flash_redirect(path: &str, kind: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}{kind}={}",
        urlencoding::encode(message)
    ))
}

/// Session endpoints and the dashboard.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/panel", get(dashboard::panel))
}

/// Inventory pages: products, variants, stock entries.
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventario", get(inventory::list))
        .route(
            "/inventario/productos/crear",
            get(inventory::product_create_page).post(inventory::product_create),
        )
        .route(
            "/inventario/productos/editar/{id}",
            get(inventory::product_edit_page).post(inventory::product_edit),
        )
        .route(
            "/inventario/productos/eliminar/{id}",
            post(inventory::product_delete),
        )
        .route(
            "/inventario/variantes/crear/{producto_id}",
            get(inventory::variant_create_page).post(inventory::variant_create),
        )
        .route(
            "/inventario/variantes/eliminar/{id}",
            post(inventory::variant_delete),
        )
        .route("/inventario/stock/{producto_id}", get(inventory::stock_page))
        .route("/inventario/stock", post(inventory::stock_entry))
        .route(
            "/inventario/movimientos/{producto_id}",
            get(inventory::movements),
        )
}

/// Catalog page and the three lookup tables.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalogo", get(catalog::overview))
        .route("/catalogo/categorias/agregar", post(catalog::category_add))
        .route(
            "/catalogo/categorias/editar/{id}",
            post(catalog::category_edit),
        )
        .route(
            "/catalogo/categorias/eliminar/{id}",
            post(catalog::category_delete),
        )
        .route("/catalogo/colores/agregar", post(catalog::color_add))
        .route("/catalogo/colores/editar/{id}", post(catalog::color_edit))
        .route(
            "/catalogo/colores/eliminar/{id}",
            post(catalog::color_delete),
        )
        .route("/catalogo/tallas/agregar", post(catalog::size_add))
        .route("/catalogo/tallas/editar/{id}", post(catalog::size_edit))
        .route("/catalogo/tallas/eliminar/{id}", post(catalog::size_delete))
}

/// Read-only order pages.
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/pedidos", get(orders::list))
        .route("/pedidos/{id}", get(orders::detail))
}

/// User management page and its JSON endpoints.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(users::list))
        .route("/usuarios/crear", post(users::create))
        .route("/usuarios/editar/{id}", post(users::edit))
        .route("/usuarios/ver/{id}", get(users::view))
        .route("/usuarios/obtener/{id}", get(users::fetch))
        .route("/usuarios/toggle/{id}", post(users::toggle_active))
}

/// Product requests and the returns placeholder.
fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/peticiones", get(requests::list))
        .route("/peticiones/atender/{id}", post(requests::attend))
        .route("/devoluciones", get(returns::placeholder))
}

/// Assemble the full admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/panel") }))
        .merge(session_routes())
        .merge(inventory_routes())
        .merge(catalog_routes())
        .merge(order_routes())
        .merge(user_routes())
        .merge(request_routes())
}
