//! Payment return pages and the Mercado Pago webhook.
//!
//! Mercado Pago redirects the buyer back with the payment id in the
//! query string. The success handler re-verifies the payment against
//! the API before touching stock; the redirect parameters alone are
//! never trusted. The webhook keeps the order's payment state current
//! when the gateway notifies asynchronously.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use liher_core::Money;

use crate::db::RepositoryError;
use crate::db::checkout::{CheckoutRepository, NewOrder, OrderOutcome};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::checkout::Order;
use crate::models::session::{CurrentUser, keys};
use crate::routes::cart::resolve_cart;
use crate::routes::checkout::read_totals;
use crate::routes::redirect_error;
use crate::services::mercado_pago::{PaymentInfo, WebhookNotification};
use crate::state::AppState;

/// Query parameters Mercado Pago appends on the return redirect.
#[derive(Debug, Deserialize)]
pub struct PaymentReturnQuery {
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub external_reference: Option<String>,
    pub preference_id: Option<String>,
}

/// Query parameters for the failure and pending pages.
#[derive(Debug, Deserialize)]
pub struct ReturnPageQuery {
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Order confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "payments/success.html")]
pub struct SuccessTemplate {
    pub user: Option<CurrentUser>,
    pub order: Option<Order>,
    pub payment_id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub amount: Money,
    pub payment_method: Option<String>,
}

/// Failed payment page.
#[derive(Template, WebTemplate)]
#[template(path = "payments/failure.html")]
pub struct FailureTemplate {
    pub user: Option<CurrentUser>,
    pub message: String,
    pub payment_id: Option<String>,
    pub status: Option<String>,
}

/// Pending payment page.
#[derive(Template, WebTemplate)]
#[template(path = "payments/pending.html")]
pub struct PendingTemplate {
    pub user: Option<CurrentUser>,
    pub message: String,
    pub payment_id: Option<String>,
    pub status: Option<String>,
}

/// The verified amount, falling back to the gateway figure when the
/// session totals are gone.
fn gateway_amount(info: &PaymentInfo) -> Money {
    info.transaction_amount
        .and_then(Decimal::from_f64_retain)
        .map_or(Money::ZERO, Money::new)
}

fn confirmation(
    user: CurrentUser,
    order: Option<Order>,
    info: &PaymentInfo,
    fallback_amount: Money,
) -> SuccessTemplate {
    let amount = order.as_ref().map_or(fallback_amount, |order| order.total);
    SuccessTemplate {
        user: Some(user),
        order,
        payment_id: info.id.to_string(),
        status: info.status.clone(),
        status_detail: info.status_detail.clone(),
        amount,
        payment_method: info.payment_method_id.clone(),
    }
}

/// Drop the checkout keys once the purchase is settled. The
/// identification and shipping stay for the next checkout.
async fn clear_checkout_session(session: &Session) {
    for key in [keys::CART_ID, keys::PREFERENCE_ID, keys::CHECKOUT_TOTALS] {
        if let Err(e) = session.remove::<serde_json::Value>(key).await {
            tracing::error!("Failed to clear session key {key}: {e}");
        }
    }
}

/// Handle the approved-payment return: verify with the gateway, deduct
/// stock and write the order, then render the confirmation.
#[instrument(skip(state, session, user))]
pub async fn payment_success(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PaymentReturnQuery>,
) -> Result<Response> {
    let Some(payment_id) = query.payment_id.filter(|id| !id.is_empty()) else {
        return Ok(Redirect::to("/pago/fallido").into_response());
    };

    let info = match state.mercado_pago().get_payment(&payment_id).await {
        Ok(info) => info,
        Err(e) => {
            tracing::error!("Failed to verify payment {payment_id}: {e}");
            return Ok(redirect_error("/pago/fallido", "No se pudo verificar el pago.")
                .into_response());
        }
    };

    if !info.is_approved() {
        return Ok(Redirect::to("/pago/pendiente").into_response());
    }

    let repo = CheckoutRepository::new(state.pool());
    let external_reference = info
        .external_reference
        .clone()
        .or(query.external_reference)
        .unwrap_or_default();

    // The webhook may have settled this payment already.
    if !external_reference.is_empty() {
        if let Some(order) = repo
            .find_order_by_external_reference(&external_reference)
            .await?
        {
            clear_checkout_session(&session).await;
            let amount = gateway_amount(&info);
            return Ok(confirmation(user, Some(order), &info, amount).into_response());
        }
    }

    let cart = resolve_cart(&state, &session, Some(&user)).await?;

    let customer = repo
        .get_identification_for_user(user.id)
        .await?
        .map_or_else(|| user.first_name.clone(), |ident| ident.full_name());

    let amount = read_totals(&session)
        .await
        .map_or_else(|| gateway_amount(&info), |totals| totals.total);

    let order = NewOrder {
        user_id: Some(user.id),
        customer,
        payment_method: info.payment_method_id.clone().unwrap_or_default(),
        total: amount,
        payment_status: info.payment_status(),
        external_reference,
        payment_id: Some(info.id.to_string()),
    };

    match repo.process_approved_payment(cart.id, order).await {
        Ok(OrderOutcome::Created(order)) => {
            clear_checkout_session(&session).await;
            Ok(confirmation(user, Some(order), &info, amount).into_response())
        }
        Ok(OrderOutcome::AlreadyCompleted) => {
            clear_checkout_session(&session).await;
            Ok(confirmation(user, None, &info, amount).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(redirect_error("/carrito", &message).into_response())
        }
        Err(RepositoryError::NotFound) => Ok(Redirect::to("/pago/fallido").into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Rejected payment return page.
#[instrument(skip(user))]
pub async fn payment_failure(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ReturnPageQuery>,
) -> FailureTemplate {
    FailureTemplate {
        user,
        message: query
            .error
            .unwrap_or_else(|| "El pago no pudo ser procesado.".to_string()),
        payment_id: query.payment_id,
        status: query.status,
    }
}

/// Pending payment return page.
#[instrument(skip(user))]
pub async fn payment_pending(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ReturnPageQuery>,
) -> PendingTemplate {
    PendingTemplate {
        user,
        message: "Tu pago está pendiente de confirmación.".to_string(),
        payment_id: query.payment_id,
        status: query.status,
    }
}

/// Receive a Mercado Pago notification and refresh the order's payment
/// state.
///
/// Always answers 200 for notifications that were understood, even when
/// no matching order exists yet; the return redirect creates the order
/// and the next notification will find it.
#[instrument(skip(state, notification))]
pub async fn mercado_pago_webhook(
    State(state): State<AppState>,
    Json(notification): Json<WebhookNotification>,
) -> Result<StatusCode> {
    match state
        .mercado_pago()
        .resolve_webhook_payment(&notification)
        .await
    {
        Ok(Some(info)) => {
            if let Some(reference) = info.external_reference.as_deref() {
                let repo = CheckoutRepository::new(state.pool());
                if let Some(order) = repo.find_order_by_external_reference(reference).await? {
                    repo.update_order_payment(
                        order.id,
                        info.payment_status(),
                        &info.id.to_string(),
                    )
                    .await?;
                    tracing::info!(
                        order_id = %order.id,
                        payment_id = info.id,
                        status = %info.status,
                        "Webhook updated order payment state"
                    );
                } else {
                    tracing::info!(
                        payment_id = info.id,
                        reference,
                        "Webhook for a payment with no order yet"
                    );
                }
            }
            Ok(StatusCode::OK)
        }
        Ok(None) => Ok(StatusCode::OK),
        Err(e) => {
            tracing::warn!("Webhook payment lookup failed: {e}");
            Ok(StatusCode::OK)
        }
    }
}
