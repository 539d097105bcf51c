//! Order routes. Read-only: the storefront writes orders when a payment
//! is approved; staff follow them here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use liher_core::{Money, OrderId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::orders::{OrderLine, OrderSummary};
use crate::models::{CurrentStaff, Section};
use crate::state::AppState;

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrdersTemplate {
    pub staff: CurrentStaff,
    pub orders: Vec<OrderSummary>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub staff: CurrentStaff,
    pub order: OrderSummary,
    pub lines: Vec<OrderLine>,
    pub items_total: Money,
}

/// Display every order, newest first.
#[instrument(skip(state, staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Response> {
    ensure_section(&staff, Section::Pedidos)?;

    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(OrdersTemplate { staff, orders }.into_response())
}

/// Display one order with its lines.
#[instrument(skip(state, staff))]
pub async fn detail(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Pedidos)?;

    let repo = OrderRepository::new(state.pool());
    let order_id = OrderId::new(id);
    let order = repo
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))?;
    let lines = repo.lines(order_id).await?;

    let items_total = lines.iter().map(OrderLine::total).sum();

    Ok(OrderDetailTemplate {
        staff,
        order,
        lines,
        items_total,
    }
    .into_response())
}
