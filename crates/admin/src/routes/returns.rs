//! Returns section.
//!
//! The returns workflow has no backend yet; the section renders a
//! placeholder page so the sidebar entry and its permission flag are
//! already in place.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Query,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::{CurrentStaff, Section};
use crate::routes::FlashQuery;

/// Returns placeholder template.
#[derive(Template, WebTemplate)]
#[template(path = "returns.html")]
pub struct ReturnsTemplate {
    pub staff: CurrentStaff,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the returns placeholder.
#[instrument(skip(staff))]
pub async fn placeholder(
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Devoluciones)?;

    Ok(ReturnsTemplate {
        staff,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}
