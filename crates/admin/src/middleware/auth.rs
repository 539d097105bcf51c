//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in staff member in route
//! handlers, plus the per-section permission gate.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentStaff, Section, session_keys};

/// Extractor that requires a logged-in staff member.
///
/// If nobody is logged in, returns a redirect to the login page, or a
/// plain 401 when the request asks for JSON.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireStaff(staff): RequireStaff,
/// ) -> impl IntoResponse {
///     format!("Hola, {}!", staff.first_name)
/// }
/// ```
pub struct RequireStaff(pub CurrentStaff);

/// Error returned when staff authentication is required but nobody is
/// logged in.
pub enum StaffRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for JSON requests).
    Unauthorized,
}

impl IntoResponse for StaffRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Whether the client asked for JSON rather than a page.
///
/// The panel's fetch() calls send `Accept: application/json`, so an
/// expired session gets a 401 they can show inline instead of a redirect
/// to HTML they cannot parse.
fn wants_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = StaffRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(StaffRejection::Unauthorized)?;

        let staff: CurrentStaff = session
            .get(session_keys::CURRENT_STAFF)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if wants_json(parts) {
                    StaffRejection::Unauthorized
                } else {
                    StaffRejection::RedirectToLogin
                }
            })?;

        Ok(Self(staff))
    }
}

/// Check the permission flag for a panel section.
///
/// # Errors
///
/// Returns [`AppError::SectionDenied`], which renders as a redirect to
/// the dashboard with a warning flash.
pub fn ensure_section(staff: &CurrentStaff, section: Section) -> Result<(), AppError> {
    if staff.can(section) {
        Ok(())
    } else {
        tracing::warn!(
            staff_id = %staff.id,
            section = section.key(),
            "Section access denied"
        );
        Err(AppError::SectionDenied)
    }
}

/// Helper to set the logged-in staff member in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_STAFF, staff).await
}

/// Helper to clear the staff member from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_staff(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use liher_core::{Email, UserId};

    use super::*;
    use crate::models::PermissionSet;

    fn staff(permissions: PermissionSet) -> CurrentStaff {
        CurrentStaff {
            id: UserId::new(3),
            email: Email::parse("staff@liherfashion.co").expect("valid email"),
            first_name: "Laura".to_string(),
            last_name: "Hernández".to_string(),
            is_superuser: false,
            permissions,
        }
    }

    #[test]
    fn ensure_section_passes_granted_flags() {
        let staff = staff(PermissionSet {
            inventario: true,
            ..PermissionSet::default()
        });
        assert!(ensure_section(&staff, Section::Inventario).is_ok());
    }

    #[test]
    fn ensure_section_rejects_missing_flags() {
        let staff = staff(PermissionSet::default());
        let err = ensure_section(&staff, Section::Pedidos);
        assert!(matches!(err, Err(AppError::SectionDenied)));
    }
}
