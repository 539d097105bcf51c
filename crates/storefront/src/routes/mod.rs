//! Storefront route handlers.
//!
//! # URL map
//!
//! ## Catalog and cart
//! - `GET  /` - home page
//! - `GET  /productos` - catalog with category/color/size filters
//! - `GET  /productos/{id}` - product detail
//! - `GET  /carrito` - cart page
//! - `POST /carrito/agregar/{variante_id}` - add to cart (JSON)
//! - `POST /carrito/actualizar/{item_id}` - change a line quantity (JSON)
//! - `POST /carrito/eliminar/{item_id}` - remove a line (JSON)
//! - `POST /carrito/limpiar` - empty the cart (JSON)
//! - `POST /peticiones/crear/{variante_id}` - request an unavailable variant (JSON)
//!
//! ## Checkout
//! - `GET/POST /identificacion` - step one: buyer identification
//! - `GET/POST /envio` - step two: shipping address and carrier
//! - `GET  /pago` - step three: payment page with the Mercado Pago widget
//! - `POST /pago/aplicar-cupon` - apply a coupon (JSON)
//! - `POST /pago/remover-cupon` - remove the coupon (JSON)
//! - `GET  /pago/exitoso` - approved-payment return: writes the order
//! - `GET  /pago/fallido` - rejected-payment return
//! - `GET  /pago/pendiente` - pending-payment return
//! - `POST /webhooks/mercadopago` - asynchronous payment notifications
//!
//! ## Accounts
//! - `GET/POST /acceso` - login
//! - `POST /login-ajax` - login for the modal (JSON)
//! - `GET  /ajax/validar-email` - email availability check (JSON)
//! - `GET  /logout` - logout
//! - `GET/POST /registro` - registration
//! - `GET  /registro/revisar/{email}` - check-your-inbox page
//! - `GET  /reenviar-activacion/{email}` - resend the activation email
//! - `GET  /activar/{uid}/{token}` - activate from the emailed link
//! - `GET/POST /restablecer-contrasena` - password reset request
//! - `GET  /correo-enviado` - reset-email-sent page
//! - `POST /reenviar-reset` - resend the reset email
//! - `GET/POST /nueva-contrasena/{uid}/{token}` - new password form
//! - `GET  /contrasena-actualizada` - reset-done page
//!
//! ## Account area
//! - `GET  /mi-cuenta` - overview
//! - `GET  /mi-perfil` - profile
//! - `GET/POST /mi-perfil/editar` - profile edit
//! - `GET  /direcciones` - saved addresses
//! - `POST /direcciones/agregar` - add an address
//! - `POST /direcciones/eliminar/{id}` - delete an address
//! - `POST /direcciones/principal/{id}` - mark the active address
//! - `GET  /mis-pedidos` - order history
//! - `GET  /mis-pedidos/{id}` - order detail

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod home;
pub mod payments;
pub mod requests;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
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

/// Redirect to `path` with a warning flash in the query string.
pub fn redirect_warning(path: &str, message: &str) -> Redirect {
    flash_redirect(path, "warning", message)
}

fn flash_redirect(path: &str, kind: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}{kind}={}",
        urlencoding::encode(message)
    ))
}

/// Catalog pages and the cart page.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/productos", get(catalog::products))
        .route("/productos/{id}", get(catalog::product_detail))
        .route("/carrito", get(cart::show))
}

/// JSON mutation endpoints, rate limited as a group.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/carrito/agregar/{variante_id}", post(cart::add))
        .route("/carrito/actualizar/{item_id}", post(cart::update))
        .route("/carrito/eliminar/{item_id}", post(cart::remove))
        .route("/carrito/limpiar", post(cart::clear))
        .route("/peticiones/crear/{variante_id}", post(requests::create_request))
        .route("/pago/aplicar-cupon", post(checkout::apply_coupon))
        .route("/pago/remover-cupon", post(checkout::remove_coupon))
        .route("/ajax/validar-email", get(auth::validate_email_ajax))
        .layer(api_rate_limiter())
}

/// The three checkout steps.
fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/identificacion",
            get(checkout::identification_page).post(checkout::save_identification),
        )
        .route(
            "/envio",
            get(checkout::shipping_page).post(checkout::save_shipping),
        )
        .route("/pago", get(checkout::payment_page))
}

/// Payment returns and the gateway webhook.
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/pago/exitoso", get(payments::payment_success))
        .route("/pago/fallido", get(payments::payment_failure))
        .route("/pago/pendiente", get(payments::payment_pending))
        .route("/webhooks/mercadopago", post(payments::mercado_pago_webhook))
}

/// Credential endpoints, rate limited against brute force.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/acceso", get(auth::login_page).post(auth::login_submit))
        .route("/login-ajax", post(auth::login_ajax))
        .route(
            "/registro",
            get(auth::register_page).post(auth::register_submit),
        )
        .route(
            "/restablecer-contrasena",
            get(auth::password_reset_page).post(auth::password_reset_submit),
        )
        .route("/reenviar-reset", post(auth::resend_reset))
        .route("/reenviar-activacion/{email}", get(auth::resend_activation))
        .route(
            "/nueva-contrasena/{uid}/{token}",
            get(auth::new_password_page).post(auth::new_password_submit),
        )
        .layer(auth_rate_limiter())
}

/// Account pages reached from emailed links or after auth actions.
fn auth_page_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", get(auth::logout))
        .route("/registro/revisar/{email}", get(auth::register_review))
        .route("/activar/{uid}/{token}", get(auth::activate))
        .route("/correo-enviado", get(auth::password_reset_sent))
        .route("/contrasena-actualizada", get(auth::password_reset_done))
}

/// The logged-in account area.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/mi-cuenta", get(account::overview))
        .route("/mi-perfil", get(account::profile))
        .route(
            "/mi-perfil/editar",
            get(account::profile_edit_page).post(account::profile_edit_submit),
        )
        .route("/direcciones", get(account::addresses))
        .route("/direcciones/agregar", post(account::add_address))
        .route("/direcciones/eliminar/{id}", post(account::delete_address))
        .route("/direcciones/principal/{id}", post(account::set_main_address))
        .route("/mis-pedidos", get(account::orders))
        .route("/mis-pedidos/{id}", get(account::order_detail))
}

/// Assemble the full storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(api_routes())
        .merge(checkout_routes())
        .merge(payment_routes())
        .merge(auth_routes())
        .merge(auth_page_routes())
        .merge(account_routes())
}
