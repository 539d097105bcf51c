//! Product request (petición) endpoint.
//!
//! Logged-in buyers can ask for an out-of-stock variant; staff attend
//! the requests from the back office.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use liher_core::ProductRequestId;

use crate::db::catalog::CatalogRepository;
use crate::db::requests::ProductRequestRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub cantidad: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RequestCreated {
    pub success: bool,
    pub message: String,
    pub peticion_id: ProductRequestId,
}

#[derive(Debug, Serialize)]
pub struct RequestRejection {
    pub success: bool,
    pub message: String,
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(RequestRejection {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Register a request for a product variant.
#[instrument(skip(state, user, body))]
pub async fn create_request(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(variant_id): Path<i32>,
    body: Option<Json<CreateRequestBody>>,
) -> Result<Response> {
    let quantity = body.and_then(|Json(b)| b.cantidad).unwrap_or(1);
    if quantity <= 0 {
        return Ok(rejection(
            StatusCode::OK,
            "La cantidad debe ser un número positivo.",
        ));
    }

    let variant = CatalogRepository::new(state.pool())
        .get_variant_with_product(variant_id.into())
        .await?;
    let Some(variant) = variant else {
        return Ok(rejection(StatusCode::NOT_FOUND, "El producto no existe."));
    };

    let request = ProductRequestRepository::new(state.pool())
        .create(user.id, variant.variant_id, quantity)
        .await?;

    tracing::info!(
        request_id = %request.id,
        variant_id = %variant.variant_id,
        "Product request registered"
    );

    Ok(Json(RequestCreated {
        success: true,
        message: format!(
            "Tu petición de \"{}\" ha sido registrada. Te avisaremos cuando esté disponible.",
            variant.product_name
        ),
        peticion_id: request.id,
    })
    .into_response())
}
