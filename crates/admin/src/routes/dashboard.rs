//! The dashboard: one card per panel section.
//!
//! Cards render only for sections the signed-in admin may enter.
//! Superusers see all of them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Query,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireStaff;
use crate::models::{CurrentStaff, Section};
use crate::routes::FlashQuery;

/// A dashboard card for one section.
pub struct SectionCard {
    pub key: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

fn section_href(section: Section) -> &'static str {
    match section {
        Section::Inicio => "/panel",
        Section::Inventario => "/inventario",
        Section::Catalogo => "/catalogo",
        Section::Pedidos => "/pedidos",
        Section::Usuarios => "/usuarios",
        Section::Devoluciones => "/devoluciones",
        Section::Peticiones => "/peticiones",
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub staff: CurrentStaff,
    pub cards: Vec<SectionCard>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the dashboard.
#[instrument(skip(staff))]
pub async fn panel(
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Response {
    let cards = Section::ALL
        .iter()
        .filter(|section| **section != Section::Inicio && staff.can(**section))
        .map(|section| SectionCard {
            key: section.key(),
            label: section.label(),
            href: section_href(*section),
        })
        .collect();

    DashboardTemplate {
        staff,
        cards,
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response()
}
