//! Product request board.
//!
//! Lists out-of-stock requests with the variant's current stock, so
//! staff can see which ones a restock already covers. The attend
//! action marks a request as handled.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use liher_core::ProductRequestId;

use crate::db::{RepositoryError, RequestRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::requests::ProductRequest;
use crate::models::{CurrentStaff, Section};
use crate::routes::{FlashQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Request board template.
#[derive(Template, WebTemplate)]
#[template(path = "requests.html")]
pub struct RequestsTemplate {
    pub staff: CurrentStaff,
    pub requests: Vec<ProductRequest>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display product requests, newest first.
#[instrument(skip(state, staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Peticiones)?;

    let requests = RequestRepository::new(state.pool()).list_all().await?;

    Ok(RequestsTemplate {
        staff,
        requests,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

/// Mark a request as attended.
#[instrument(skip(state, staff))]
pub async fn attend(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Peticiones)?;

    match RequestRepository::new(state.pool())
        .attend(ProductRequestId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(request_id = id, staff_id = %staff.id, "Product request attended");
            Ok(redirect_success("/peticiones", "Petición marcada como atendida.").into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_error("/peticiones", "La petición ya no existe.").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
