//! Account area: profile, saved addresses and order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use liher_core::ShippingCarrier;

use crate::db::RepositoryError;
use crate::db::checkout::{CheckoutRepository, ShippingInput};
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::checkout::{Order, OrderLine, ShippingAddress};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::routes::checkout::{CarrierOption, ShippingForm, carrier_options};
use crate::routes::{FlashQuery, redirect_error, redirect_success};
use crate::services::shipping;
use crate::state::AppState;

/// The full account row for the logged-in user, or a login redirect if
/// the account vanished under the session.
async fn load_account(state: &AppState, user: &CurrentUser) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))
}

// =============================================================================
// Overview and profile
// =============================================================================

/// Account overview page.
#[derive(Template, WebTemplate)]
#[template(path = "account/overview.html")]
pub struct OverviewTemplate {
    pub user: Option<CurrentUser>,
    pub account: User,
    pub success: Option<String>,
}

/// Display the account overview.
#[instrument(skip(state, user))]
pub async fn overview(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<OverviewTemplate> {
    let account = load_account(&state, &user).await?;
    Ok(OverviewTemplate {
        user: Some(user),
        account,
        success: query.success,
    })
}

/// Profile page.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub account: User,
    pub success: Option<String>,
}

/// Display the profile.
#[instrument(skip(state, user))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<ProfileTemplate> {
    let account = load_account(&state, &user).await?;
    Ok(ProfileTemplate {
        user: Some(user),
        account,
        success: query.success,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub celular: String,
}

/// Profile edit form.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile_edit.html")]
pub struct ProfileEditTemplate {
    pub user: Option<CurrentUser>,
    pub form: ProfileForm,
    pub error: Option<String>,
}

/// Display the profile edit form.
#[instrument(skip(state, user))]
pub async fn profile_edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ProfileEditTemplate> {
    let account = load_account(&state, &user).await?;
    Ok(ProfileEditTemplate {
        user: Some(user),
        form: ProfileForm {
            nombre: account.first_name,
            apellido: account.last_name,
            celular: account.phone.unwrap_or_default(),
        },
        error: None,
    })
}

/// Save the profile edit.
#[instrument(skip(state, session, user, form))]
pub async fn profile_edit_submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let first_name = form.nombre.trim();
    let last_name = form.apellido.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Ok(ProfileEditTemplate {
            user: Some(user),
            form,
            error: Some("El nombre y el apellido son obligatorios.".to_string()),
        }
        .into_response());
    }

    let phone = form.celular.trim();
    UserRepository::new(state.pool())
        .update_profile(
            user.id,
            first_name,
            last_name,
            (!phone.is_empty()).then_some(phone),
        )
        .await?;

    // Keep the header greeting in sync with the new name.
    let refreshed = CurrentUser {
        id: user.id,
        email: user.email,
        first_name: first_name.to_string(),
    };
    set_current_user(&session, &refreshed).await?;

    Ok(redirect_success("/mi-perfil", "Tu perfil ha sido actualizado.").into_response())
}

// =============================================================================
// Addresses
// =============================================================================

/// Saved addresses page.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub user: Option<CurrentUser>,
    pub addresses: Vec<ShippingAddress>,
    pub carriers: Vec<CarrierOption>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the saved addresses.
#[instrument(skip(state, user))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<AddressesTemplate> {
    let addresses = CheckoutRepository::new(state.pool())
        .list_shipping_for_user(user.id)
        .await?;
    Ok(AddressesTemplate {
        user: Some(user),
        addresses,
        carriers: carrier_options(),
        error: query.error,
        success: query.success,
    })
}

/// Add a shipping address and make it the active one.
#[instrument(skip(state, user, form))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Redirect> {
    let required = [
        form.departamento.trim(),
        form.municipio.trim(),
        form.tipo_direccion.trim(),
        form.calle.trim(),
        form.numero.trim(),
        form.barrio.trim(),
        form.nombre_receptor.trim(),
        form.telefono_receptor.trim(),
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Ok(redirect_error(
            "/direcciones",
            "Completa todos los datos de la dirección.",
        ));
    }

    let carrier = form
        .empresa_envio
        .parse::<ShippingCarrier>()
        .unwrap_or(ShippingCarrier::Coordinadora);
    let floor = form.piso.trim();

    let repo = CheckoutRepository::new(state.pool());
    let identification_id = repo
        .get_identification_for_user(user.id)
        .await?
        .map(|ident| ident.id);

    let input = ShippingInput {
        department: form.departamento.trim(),
        municipality: form.municipio.trim(),
        address_type: form.tipo_direccion.trim(),
        street: form.calle.trim(),
        letter: form.letra.trim(),
        number: form.numero.trim(),
        neighborhood: form.barrio.trim(),
        floor: (!floor.is_empty()).then_some(floor),
        receiver_name: form.nombre_receptor.trim(),
        receiver_phone: form.telefono_receptor.trim(),
        carrier,
        cost: shipping::carrier_cost(carrier),
    };
    repo.replace_active_shipping(Some(user.id), identification_id, input)
        .await?;

    Ok(redirect_success(
        "/direcciones",
        "Dirección agregada correctamente.",
    ))
}

/// Delete a saved address.
#[instrument(skip(state, user))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let deleted = CheckoutRepository::new(state.pool())
        .delete_shipping_for_user(id.into(), user.id)
        .await?;
    if deleted {
        Ok(redirect_success(
            "/direcciones",
            "Dirección eliminada correctamente.",
        ))
    } else {
        Ok(redirect_error("/direcciones", "La dirección no existe."))
    }
}

/// Mark a saved address as the active one.
#[instrument(skip(state, user))]
pub async fn set_main_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    match CheckoutRepository::new(state.pool())
        .activate_shipping_for_user(id.into(), user.id)
        .await
    {
        Ok(()) => Ok(redirect_success(
            "/direcciones",
            "Dirección principal actualizada.",
        )),
        Err(RepositoryError::NotFound) => {
            Ok(redirect_error("/direcciones", "La dirección no existe."))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order history page.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub user: Option<CurrentUser>,
    pub orders: Vec<Order>,
}

/// Display the order history.
#[instrument(skip(state, user))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersTemplate> {
    let orders = CheckoutRepository::new(state.pool())
        .list_orders_for_user(user.id)
        .await?;
    Ok(OrdersTemplate {
        user: Some(user),
        orders,
    })
}

/// Order detail page.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub user: Option<CurrentUser>,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Display one order with its lines.
#[instrument(skip(state, user))]
pub async fn order_detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<OrderDetailTemplate> {
    let repo = CheckoutRepository::new(state.pool());
    let order = repo
        .get_order_for_user(id.into(), user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))?;
    let lines = repo.list_order_lines(order.id).await?;

    Ok(OrderDetailTemplate {
        user: Some(user),
        order,
        lines,
    })
}
