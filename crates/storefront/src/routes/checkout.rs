//! Checkout route handlers: identification, shipping and the payment page.
//!
//! Three steps, all behind login. Each step validates the previous one
//! and keeps its result in the session, so refreshing or jumping back
//! never loses progress. The payment page builds the Mercado Pago
//! preference and hands the buyer to the hosted checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use liher_core::{DocumentType, Email, IdentificationId, Money, ShippingCarrier};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::checkout::{CheckoutRepository, IdentificationInput, ShippingInput};
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::cart::{CartLine, subtotal};
use crate::models::checkout::{CheckoutTotals, Identification, ShippingAddress};
use crate::models::session::{CurrentUser, keys};
use crate::routes::cart::resolve_cart;
use crate::routes::{FlashQuery, redirect_error, redirect_success, redirect_warning};
use crate::services::coupons;
use crate::services::mercado_pago::{
    BackUrls, PayerAddress, PayerIdentification, PayerPhone, PaymentMethods, PreferenceItem,
    PreferencePayer, PreferenceRequest,
};
use crate::services::shipping;
use crate::state::AppState;

/// Read the running totals from the session.
pub async fn read_totals(session: &Session) -> Option<CheckoutTotals> {
    session
        .get::<CheckoutTotals>(keys::CHECKOUT_TOTALS)
        .await
        .ok()
        .flatten()
}

/// Store the running totals in the session.
pub async fn store_totals(session: &Session, totals: &CheckoutTotals) {
    if let Err(e) = session.insert(keys::CHECKOUT_TOTALS, totals).await {
        tracing::error!("Failed to store checkout totals in session: {e}");
    }
}

// =============================================================================
// Step one: identification
// =============================================================================

/// Form values for the identification step.
///
/// Kept as plain strings so a failed validation can re-render the form
/// with everything the buyer typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentificationForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub tipo_documento: String,
    #[serde(default)]
    pub numero_documento: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub celular: String,
}

impl IdentificationForm {
    fn from_identification(ident: &Identification) -> Self {
        Self {
            nombre: ident.first_name.clone(),
            apellido: ident.last_name.clone(),
            tipo_documento: ident.document_type.code().to_string(),
            numero_documento: ident.document_number.clone(),
            email: ident.email.as_str().to_string(),
            celular: ident.phone.clone(),
        }
    }
}

/// Identification page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/identification.html")]
pub struct IdentificationTemplate {
    pub user: Option<CurrentUser>,
    pub form: IdentificationForm,
    pub document_types: Vec<DocumentType>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// The buyer's identification: theirs by user id, or adopted from a
/// guest checkout with the same email.
async fn find_identification(
    repo: &CheckoutRepository<'_>,
    user: &CurrentUser,
) -> Result<Option<Identification>> {
    if let Some(ident) = repo.get_identification_for_user(user.id).await? {
        return Ok(Some(ident));
    }
    Ok(repo
        .adopt_identification_by_email(user.id, &user.email)
        .await?)
}

/// Display the identification form, pre-filled from a previous checkout
/// or from the account.
#[instrument(skip(state, session, user))]
pub async fn identification_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    let cart = resolve_cart(&state, &session, Some(&user)).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(redirect_warning(
            "/productos",
            "Tu carrito está vacío. Agrega productos antes de continuar.",
        )
        .into_response());
    }

    let repo = CheckoutRepository::new(state.pool());
    let form = match find_identification(&repo, &user).await? {
        Some(ident) => IdentificationForm::from_identification(&ident),
        None => {
            let account = UserRepository::new(state.pool()).get_by_id(user.id).await?;
            account.map_or_else(IdentificationForm::default, |account| IdentificationForm {
                nombre: account.first_name,
                apellido: account.last_name,
                email: account.email.as_str().to_string(),
                celular: account.phone.unwrap_or_default(),
                ..IdentificationForm::default()
            })
        }
    };

    Ok(IdentificationTemplate {
        user: Some(user),
        form,
        document_types: DocumentType::ALL.to_vec(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Save the identification and advance to the shipping step.
#[instrument(skip(state, session, user, form))]
pub async fn save_identification(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<IdentificationForm>,
) -> Result<Response> {
    let cart = resolve_cart(&state, &session, Some(&user)).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(redirect_warning(
            "/productos",
            "Tu carrito está vacío. Agrega productos antes de continuar.",
        )
        .into_response());
    }

    let rerender = |form: IdentificationForm, error: &str| {
        IdentificationTemplate {
            user: Some(user.clone()),
            form,
            document_types: DocumentType::ALL.to_vec(),
            error: Some(error.to_string()),
            success: None,
        }
        .into_response()
    };

    let required = [
        form.nombre.trim(),
        form.apellido.trim(),
        form.numero_documento.trim(),
        form.email.trim(),
        form.celular.trim(),
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Ok(rerender(form, "Todos los campos son obligatorios."));
    }

    let Ok(document_type) = form.tipo_documento.parse::<DocumentType>() else {
        return Ok(rerender(form, "Selecciona un tipo de documento válido."));
    };
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(rerender(form, "Ingresa un correo electrónico válido."));
    };

    let repo = CheckoutRepository::new(state.pool());
    let input = IdentificationInput {
        email: &email,
        first_name: form.nombre.trim(),
        last_name: form.apellido.trim(),
        document_type,
        document_number: form.numero_documento.trim(),
        phone: form.celular.trim(),
    };

    let ident = match repo.upsert_identification_for_user(user.id, input).await {
        Ok(ident) => ident,
        Err(RepositoryError::Conflict(_)) => {
            return Ok(rerender(
                form,
                "Ya existe una identificación con ese correo electrónico.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = session.insert(keys::IDENTIFICATION_ID, ident.id).await {
        tracing::error!("Failed to store identification id in session: {e}");
    }

    // Seed the running totals with the cart subtotal; the shipping step
    // fills in the rest.
    let previous = read_totals(&session).await;
    let totals = CheckoutTotals::compute(
        subtotal(&lines),
        previous.as_ref().map_or(Money::ZERO, |t| t.shipping),
        previous.as_ref().map_or(Money::ZERO, |t| t.discount),
        previous.and_then(|t| t.coupon),
    );
    store_totals(&session, &totals).await;

    Ok(redirect_success(
        "/envio",
        "Tus datos de identificación han sido guardados correctamente.",
    )
    .into_response())
}

// =============================================================================
// Step two: shipping
// =============================================================================

/// Form values for the shipping step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub tipo_direccion: String,
    #[serde(default)]
    pub calle: String,
    #[serde(default)]
    pub letra: String,
    #[serde(default)]
    pub numero: String,
    #[serde(default)]
    pub barrio: String,
    #[serde(default)]
    pub piso: String,
    #[serde(default)]
    pub nombre_receptor: String,
    #[serde(default)]
    pub telefono_receptor: String,
    #[serde(default)]
    pub empresa_envio: String,
}

impl ShippingForm {
    fn from_address(address: &ShippingAddress) -> Self {
        Self {
            departamento: address.department.clone(),
            municipio: address.municipality.clone(),
            tipo_direccion: address.address_type.clone(),
            calle: address.street.clone(),
            letra: address.letter.clone(),
            numero: address.number.clone(),
            barrio: address.neighborhood.clone(),
            piso: address.floor.clone().unwrap_or_default(),
            nombre_receptor: address.receiver_name.clone(),
            telefono_receptor: address.receiver_phone.clone(),
            empresa_envio: address.carrier.code().to_string(),
        }
    }
}

/// A carrier choice with its flat cost, for the shipping form.
pub struct CarrierOption {
    pub code: &'static str,
    pub label: &'static str,
    pub cost: Money,
}

pub(crate) fn carrier_options() -> Vec<CarrierOption> {
    ShippingCarrier::ALL
        .into_iter()
        .map(|carrier| CarrierOption {
            code: carrier.code(),
            label: carrier.label(),
            cost: shipping::carrier_cost(carrier),
        })
        .collect()
}

/// Shipping page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub user: Option<CurrentUser>,
    pub form: ShippingForm,
    pub carriers: Vec<CarrierOption>,
    pub subtotal: Money,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// The identification saved in this session, if step one was completed.
async fn session_identification(
    repo: &CheckoutRepository<'_>,
    session: &Session,
) -> Result<Option<Identification>> {
    let Some(id) = session
        .get::<IdentificationId>(keys::IDENTIFICATION_ID)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };
    Ok(repo.get_identification(id).await?)
}

/// Display the shipping form.
#[instrument(skip(state, session, user))]
pub async fn shipping_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    let repo = CheckoutRepository::new(state.pool());
    let Some(ident) = session_identification(&repo, &session).await? else {
        return Ok(redirect_error(
            "/identificacion",
            "Por favor completa tu identificación primero.",
        )
        .into_response());
    };

    let cart = resolve_cart(&state, &session, Some(&user)).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(
            redirect_error("/carrito", "Tu carrito está vacío.").into_response(),
        );
    }

    let form = match repo.get_active_shipping(user.id).await? {
        Some(address) => ShippingForm::from_address(&address),
        None => ShippingForm {
            nombre_receptor: ident.full_name(),
            telefono_receptor: ident.phone.clone(),
            empresa_envio: ShippingCarrier::Coordinadora.code().to_string(),
            ..ShippingForm::default()
        },
    };

    Ok(ShippingTemplate {
        user: Some(user),
        form,
        carriers: carrier_options(),
        subtotal: subtotal(&lines),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Save the shipping address and advance to the payment step.
#[instrument(skip(state, session, user, form))]
pub async fn save_shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let repo = CheckoutRepository::new(state.pool());
    let Some(ident) = session_identification(&repo, &session).await? else {
        return Ok(redirect_error(
            "/identificacion",
            "Por favor completa tu identificación primero.",
        )
        .into_response());
    };

    let cart = resolve_cart(&state, &session, Some(&user)).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(
            redirect_error("/carrito", "Tu carrito está vacío.").into_response(),
        );
    }

    let required = [
        form.departamento.trim(),
        form.municipio.trim(),
        form.tipo_direccion.trim(),
        form.calle.trim(),
        form.numero.trim(),
        form.barrio.trim(),
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Ok(ShippingTemplate {
            user: Some(user),
            form,
            carriers: carrier_options(),
            subtotal: subtotal(&lines),
            error: Some("Completa todos los datos de la dirección.".to_string()),
            success: None,
        }
        .into_response());
    }

    // Unknown carrier values quote the base rate.
    let carrier = form
        .empresa_envio
        .parse::<ShippingCarrier>()
        .unwrap_or(ShippingCarrier::Coordinadora);
    let cost = shipping::carrier_cost(carrier);

    let receiver_name = if form.nombre_receptor.trim().is_empty() {
        ident.full_name()
    } else {
        form.nombre_receptor.trim().to_string()
    };
    let receiver_phone = if form.telefono_receptor.trim().is_empty() {
        ident.phone.clone()
    } else {
        form.telefono_receptor.trim().to_string()
    };
    let floor = form.piso.trim();

    let input = ShippingInput {
        department: form.departamento.trim(),
        municipality: form.municipio.trim(),
        address_type: form.tipo_direccion.trim(),
        street: form.calle.trim(),
        letter: form.letra.trim(),
        number: form.numero.trim(),
        neighborhood: form.barrio.trim(),
        floor: (!floor.is_empty()).then_some(floor),
        receiver_name: &receiver_name,
        receiver_phone: &receiver_phone,
        carrier,
        cost,
    };

    let address = repo
        .replace_active_shipping(Some(user.id), Some(ident.id), input)
        .await?;

    if let Err(e) = session.insert(keys::SHIPPING_ID, address.id).await {
        tracing::error!("Failed to store shipping id in session: {e}");
    }

    let previous = read_totals(&session).await;
    let totals = CheckoutTotals::compute(
        subtotal(&lines),
        cost,
        previous.as_ref().map_or(Money::ZERO, |t| t.discount),
        previous.and_then(|t| t.coupon),
    );
    store_totals(&session, &totals).await;

    Ok(redirect_success(
        "/pago",
        "Información de envío guardada correctamente.",
    )
    .into_response())
}

// =============================================================================
// Step three: payment
// =============================================================================

/// Payment page template.
///
/// Renders the order summary and mounts the Mercado Pago checkout
/// widget with the created preference.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub user: Option<CurrentUser>,
    pub identification: Identification,
    pub shipping: ShippingAddress,
    pub lines: Vec<CartLine>,
    pub totals: CheckoutTotals,
    pub coupon_name: Option<&'static str>,
    pub preference_id: Option<String>,
    pub public_key: String,
    pub error_message: Option<String>,
    pub success: Option<String>,
}

fn preference_payer(ident: &Identification, address: &ShippingAddress) -> PreferencePayer {
    PreferencePayer {
        name: ident.first_name.clone(),
        surname: ident.last_name.clone(),
        email: ident.email.as_str().to_string(),
        phone: PayerPhone {
            number: ident.phone.clone(),
        },
        identification: PayerIdentification {
            document_type: ident.document_type.code().to_string(),
            number: ident.document_number.clone(),
        },
        address: PayerAddress {
            street_name: address.full_address(),
            city_name: address.municipality.clone(),
            state_name: address.department.clone(),
        },
    }
}

/// Build the preference items: one per cart line, plus shipping and the
/// coupon discount when present.
fn preference_items(
    lines: &[CartLine],
    shipping: &ShippingAddress,
    totals: &CheckoutTotals,
) -> Vec<PreferenceItem> {
    let mut items: Vec<PreferenceItem> = lines
        .iter()
        .map(|line| {
            PreferenceItem::cop(
                format!(
                    "{} - {}/{}",
                    line.product_name, line.color_name, line.size_name
                ),
                u32::try_from(line.quantity).unwrap_or(1),
                line.unit_price,
            )
        })
        .collect();

    if totals.shipping.is_positive() {
        items.push(PreferenceItem::cop(
            format!("Envío - {}", shipping.carrier.label()),
            1,
            totals.shipping,
        ));
    }

    if let Some(coupon) = totals.coupon.as_deref() {
        if totals.discount.is_positive() {
            items.push(PreferenceItem::cop(
                format!("Descuento cupón - {coupon}"),
                1,
                -totals.discount,
            ));
        }
    }

    items
}

/// Display the payment page, creating the Mercado Pago preference.
#[instrument(skip(state, session, user))]
pub async fn payment_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    let repo = CheckoutRepository::new(state.pool());

    let Some(ident) = session_identification(&repo, &session).await? else {
        return Ok(redirect_error(
            "/identificacion",
            "Debes completar tu identificación primero.",
        )
        .into_response());
    };
    let Some(address) = repo.get_active_shipping(user.id).await? else {
        return Ok(redirect_error(
            "/envio",
            "Debes completar los datos de envío primero.",
        )
        .into_response());
    };

    let cart = resolve_cart(&state, &session, Some(&user)).await?;
    let lines = CartRepository::new(state.pool()).list_lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(Redirect::to("/carrito").into_response());
    }

    let previous = read_totals(&session).await;
    let totals = CheckoutTotals::compute(
        subtotal(&lines),
        address.cost,
        previous.as_ref().map_or(Money::ZERO, |t| t.discount),
        previous.and_then(|t| t.coupon),
    );
    store_totals(&session, &totals).await;

    let base_url = state.config().base_url.trim_end_matches('/');
    let external_reference = format!(
        "PEDIDO-{}-{}",
        user.id,
        chrono::Utc::now().timestamp()
    );

    let request = PreferenceRequest {
        items: preference_items(&lines, &address, &totals),
        payer: preference_payer(&ident, &address),
        back_urls: BackUrls {
            success: format!("{base_url}/pago/exitoso"),
            failure: format!("{base_url}/pago/fallido"),
            pending: format!("{base_url}/pago/pendiente"),
        },
        auto_return: Some("approved".to_string()),
        // The gateway only accepts publicly reachable notification URLs.
        notification_url: state
            .config()
            .is_https()
            .then(|| format!("{base_url}/webhooks/mercadopago")),
        payment_methods: PaymentMethods::with_installments(12),
        statement_descriptor: "LIHER FASHION".to_string(),
        external_reference,
        expires: false,
    };

    let (preference_id, error_message) = match state.mercado_pago().create_preference(&request).await
    {
        Ok(preference) => {
            if let Err(e) = session.insert(keys::PREFERENCE_ID, &preference.id).await {
                tracing::error!("Failed to store preference id in session: {e}");
            }
            (Some(preference.id), None)
        }
        Err(e) => {
            tracing::error!("Failed to create payment preference: {e}");
            (
                None,
                Some("Error al crear preferencia de pago. Intenta nuevamente.".to_string()),
            )
        }
    };

    let coupon_name = totals
        .coupon
        .as_deref()
        .and_then(coupons::find)
        .map(|coupon| coupon.name);

    Ok(PaymentTemplate {
        user: Some(user),
        identification: ident,
        shipping: address,
        lines,
        totals,
        coupon_name,
        preference_id,
        public_key: state.mercado_pago().public_key().to_string(),
        error_message,
        success: query.success,
    }
    .into_response())
}

// =============================================================================
// Coupons
// =============================================================================

/// JSON body for the apply-coupon endpoint.
#[derive(Debug, Deserialize)]
pub struct CouponBody {
    pub cupon: Option<String>,
}

/// JSON answer when a coupon is applied.
#[derive(Debug, Serialize)]
pub struct CouponApplied {
    pub success: bool,
    pub descuento: f64,
    pub descuento_formatted: String,
    pub nuevo_total: f64,
    pub nuevo_total_formatted: String,
    pub message: String,
    pub cupon_nombre: String,
}

/// JSON answer when a coupon is removed.
#[derive(Debug, Serialize)]
pub struct CouponRemoved {
    pub success: bool,
    pub message: String,
    pub nuevo_total: f64,
    pub nuevo_total_formatted: String,
}

/// JSON answer for a rejected coupon.
#[derive(Debug, Serialize)]
pub struct CouponRejection {
    pub success: bool,
    pub message: String,
}

fn coupon_rejection(message: &str) -> Response {
    Json(CouponRejection {
        success: false,
        message: message.to_string(),
    })
    .into_response()
}

/// Validate and apply a coupon against the session totals.
#[instrument(skip(session, user, body), fields(user_id = %user.id))]
pub async fn apply_coupon(
    session: Session,
    RequireAuth(user): RequireAuth,
    body: Option<Json<CouponBody>>,
) -> Result<Response> {
    let code = body
        .and_then(|Json(b)| b.cupon)
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_default();
    if code.is_empty() {
        return Ok(coupon_rejection("Código de cupón inválido"));
    }

    let Some(coupon) = coupons::find(&code) else {
        return Ok(coupon_rejection("Cupón inválido o expirado"));
    };

    let previous = read_totals(&session).await;
    let cart_subtotal = previous.as_ref().map_or(Money::ZERO, |t| t.subtotal);
    let shipping_cost = previous.as_ref().map_or(Money::ZERO, |t| t.shipping);

    let discount = coupon.discount_for(cart_subtotal);
    let totals = CheckoutTotals::compute(
        cart_subtotal,
        shipping_cost,
        discount,
        Some(coupon.code.to_string()),
    );
    store_totals(&session, &totals).await;

    Ok(Json(CouponApplied {
        success: true,
        descuento: discount.to_f64(),
        descuento_formatted: discount.formatted(),
        nuevo_total: totals.total.to_f64(),
        nuevo_total_formatted: totals.total.formatted(),
        message: format!("✓ Cupón aplicado: {}", coupon.name),
        cupon_nombre: coupon.name.to_string(),
    })
    .into_response())
}

/// Remove the applied coupon and restore the totals.
#[instrument(skip(session, user), fields(user_id = %user.id))]
pub async fn remove_coupon(
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let previous = read_totals(&session).await;
    let cart_subtotal = previous.as_ref().map_or(Money::ZERO, |t| t.subtotal);
    let shipping_cost = previous.as_ref().map_or(Money::ZERO, |t| t.shipping);

    let totals = CheckoutTotals::compute(cart_subtotal, shipping_cost, Money::ZERO, None);
    store_totals(&session, &totals).await;

    Ok(Json(CouponRemoved {
        success: true,
        message: "Cupón removido correctamente".to_string(),
        nuevo_total: totals.total.to_f64(),
        nuevo_total_formatted: totals.total.formatted(),
    })
    .into_response())
}
