//! User management routes.
//!
//! The page itself is server-rendered; creation, editing, the detail
//! card, and the active toggle are fetch() calls answering JSON. Staff
//! accounts created here start inactive and receive the same activation
//! email a self-registered customer gets, with the link opening on the
//! storefront.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::JsonRejection as AxumJsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use liher_core::{Email, UserId, password, tokens};

use crate::db::{PermissionRepository, RepositoryError, UserRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireStaff, ensure_section};
use crate::models::users::{ManagedUser, UserCounts};
use crate::models::{CurrentStaff, PermissionSet, Section};
use crate::routes::FlashQuery;
use crate::state::AppState;

// =============================================================================
// Page
// =============================================================================

/// A permission checkbox in the create/edit modals.
pub struct SectionOption {
    pub key: &'static str,
    pub label: &'static str,
}

/// User management page template.
#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub staff: CurrentStaff,
    pub users: Vec<ManagedUser>,
    pub counts: UserCounts,
    pub sections: Vec<SectionOption>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

fn section_options() -> Vec<SectionOption> {
    Section::ALL
        .iter()
        .map(|section| SectionOption {
            key: section.key(),
            label: section.label(),
        })
        .collect()
}

/// Display the user table with its header counts.
#[instrument(skip(state, staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    let repo = UserRepository::new(state.pool());
    let users = repo.list().await?;
    let counts = repo.counts().await?;

    Ok(UsersTemplate {
        staff,
        users,
        counts,
        sections: section_options(),
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

// =============================================================================
// JSON helpers
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRejection {
    success: bool,
    message: String,
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(JsonRejection {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Active/inactive pair for the header cards, refreshed after mutations.
#[derive(Debug, Serialize)]
struct CountsPayload {
    activos: i64,
    inactivos: i64,
}

impl From<UserCounts> for CountsPayload {
    fn from(counts: UserCounts) -> Self {
        Self {
            activos: counts.active,
            inactivos: counts.total - counts.active,
        }
    }
}

// =============================================================================
// Create
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    #[serde(default)]
    pub rol: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub permisos: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreatedUserPayload {
    id: i32,
    email: String,
    nombre: String,
    rol: &'static str,
    activo: bool,
}

#[derive(Debug, Serialize)]
struct CreateUserResponse {
    success: bool,
    message: String,
    user: CreatedUserPayload,
    stats: CountsPayload,
}

fn validate_admin_phone(phone: &str) -> std::result::Result<(), &'static str> {
    if phone.is_empty() {
        return Err("El teléfono es obligatorio para administradores.");
    }
    if phone.len() < 7 || phone.len() > 15 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("El teléfono debe contener solo números y tener entre 7 y 15 dígitos.");
    }
    Ok(())
}

/// Create an account from the modal.
///
/// Role `usuario` creates a customer, `administrador` a staff account
/// with the chosen permission flags. Either way the account starts
/// inactive and the owner activates it from the emailed link.
#[instrument(skip(state, staff, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    body: std::result::Result<Json<CreateUserBody>, AxumJsonRejection>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    let Ok(Json(body)) = body else {
        return Ok(rejection(StatusCode::BAD_REQUEST, "Datos inválidos."));
    };

    let Ok(email) = Email::parse(&body.email) else {
        return Ok(rejection(
            StatusCode::BAD_REQUEST,
            "Ingresa un correo electrónico válido.",
        ));
    };

    if let Err(e) = password::validate_pair(&body.password1, &body.password2) {
        return Ok(rejection(StatusCode::BAD_REQUEST, &e.to_string()));
    }

    let first_name = body.first_name.trim();
    let last_name = body.last_name.trim();
    let phone = body.phone.trim();

    let is_staff = match body.rol.as_str() {
        "usuario" => false,
        "administrador" => {
            if let Err(message) = validate_admin_phone(phone) {
                return Ok(rejection(StatusCode::BAD_REQUEST, message));
            }
            true
        }
        _ => return Ok(rejection(StatusCode::BAD_REQUEST, "Rol inválido.")),
    };

    let Ok(password_hash) = password::hash(&body.password1) else {
        return Ok(rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No se pudo crear la cuenta.",
        ));
    };

    let users = UserRepository::new(state.pool());
    let user = match users
        .create(
            &email,
            &password_hash,
            first_name,
            last_name,
            Some(phone).filter(|p| !p.is_empty()),
            is_staff,
        )
        .await
    {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            return Ok(rejection(
                StatusCode::BAD_REQUEST,
                "Ya existe una cuenta con ese correo.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if is_staff {
        let permissions = PermissionSet::from_keys(&body.permisos);
        PermissionRepository::new(state.pool())
            .upsert(user.id, &permissions)
            .await?;
    }

    let claim = tokens::activation_claim(user.id, user.is_active);
    let uid = tokens::encode_uid(user.id);
    let token = tokens::generate(&state.config().token_secret, &claim);

    if let Err(e) = state
        .email()
        .send_activation_email(user.email.as_str(), &user.first_name, &uid, &token)
        .await
    {
        tracing::error!(user_id = %user.id, error = %e, "Activation email failed");
        return Ok(rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error enviando correo de activación.",
        ));
    }

    tracing::info!(user_id = %user.id, staff_id = %staff.id, is_staff, "Account created from panel");

    let counts = users.counts().await?;
    Ok(Json(CreateUserResponse {
        success: true,
        message: "Registro exitoso. Revisa tu correo para activar la cuenta.".to_string(),
        user: CreatedUserPayload {
            id: user.id.as_i32(),
            email: user.email.as_str().to_string(),
            nombre: user.full_name(),
            rol: user.role_label(),
            activo: user.is_active,
        },
        stats: counts.into(),
    })
    .into_response())
}

// =============================================================================
// Edit
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    #[serde(default)]
    pub is_admin: String,
    #[serde(default)]
    pub is_active: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    /// JSON list of `{"nombre": ..., "activo": ...}` pairs.
    #[serde(default)]
    pub permisos: String,
}

#[derive(Debug, Deserialize)]
struct PermissionItem {
    #[serde(default)]
    nombre: String,
    #[serde(default)]
    activo: bool,
}

fn to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "on")
}

/// Parse a permission name as the modal sends it; the labels come back
/// accented ("Catálogo") while the stored keys are plain.
fn parse_section_name(raw: &str) -> Option<Section> {
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "catálogo" => Some(Section::Catalogo),
        other => other.parse().ok(),
    }
}

#[derive(Debug, Serialize)]
struct EditUserResponse {
    success: bool,
    message: String,
}

/// Apply the edit modal: activity always, names/phone and permission
/// flags when the account is flagged as admin in the form.
#[instrument(skip(state, staff, form))]
pub async fn edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
    Form(form): Form<EditUserForm>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    let user_id = UserId::new(id);
    let users = UserRepository::new(state.pool());
    let Some(user) = users.get_by_id(user_id).await? else {
        return Ok(rejection(StatusCode::NOT_FOUND, "Usuario no encontrado."));
    };

    let is_admin = to_bool(&form.is_admin);
    let is_active = to_bool(&form.is_active);

    let (first_name, last_name, phone) = if is_admin {
        (
            form.first_name.trim().to_string(),
            form.last_name.trim().to_string(),
            Some(form.phone.trim().to_string()).filter(|p| !p.is_empty()),
        )
    } else {
        (user.first_name.clone(), user.last_name.clone(), user.phone.clone())
    };

    users
        .update_details(
            user_id,
            &first_name,
            &last_name,
            phone.as_deref(),
            user.is_staff,
            is_active,
        )
        .await?;

    if is_admin && !form.permisos.trim().is_empty() {
        let Ok(items) = serde_json::from_str::<Vec<PermissionItem>>(&form.permisos) else {
            return Ok(rejection(StatusCode::BAD_REQUEST, "Permisos inválidos."));
        };

        let permissions_repo = PermissionRepository::new(state.pool());
        let mut permissions = permissions_repo.get(user_id).await?;
        for item in items {
            if let Some(section) = parse_section_name(&item.nombre) {
                permissions.set(section, item.activo);
            }
        }
        permissions_repo.upsert(user_id, &permissions).await?;
    }

    tracing::info!(user_id = id, staff_id = %staff.id, "Account updated from panel");

    Ok(Json(EditUserResponse {
        success: true,
        message: "Usuario actualizado correctamente.".to_string(),
    })
    .into_response())
}

// =============================================================================
// Detail and prefill JSON
// =============================================================================

#[derive(Debug, Serialize)]
struct PermissionEntry {
    nombre: &'static str,
    activo: bool,
}

#[derive(Debug, Serialize)]
struct UserDetailResponse {
    full_name: String,
    initials: String,
    email: String,
    phone: String,
    role: &'static str,
    status: &'static str,
    date_joined: String,
    last_login: String,
    permissions: Vec<PermissionEntry>,
}

/// Detail card JSON for the view modal.
#[instrument(skip(state, staff))]
pub async fn view(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    let user_id = UserId::new(id);
    let Some(user) = UserRepository::new(state.pool()).get_by_id(user_id).await? else {
        return Ok(rejection(StatusCode::NOT_FOUND, "Usuario no encontrado."));
    };

    let permissions = if user.is_staff {
        let set = PermissionRepository::new(state.pool()).get(user_id).await?;
        Section::ALL
            .iter()
            .map(|section| PermissionEntry {
                nombre: section.label(),
                activo: set.allows(*section),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(UserDetailResponse {
        full_name: user.full_name(),
        initials: user.initials(),
        email: user.email.as_str().to_string(),
        phone: user.phone.clone().unwrap_or_else(|| "-".to_string()),
        role: user.role_label(),
        status: user.status_label(),
        date_joined: user.date_joined.format("%d/%m/%Y").to_string(),
        last_login: user.last_login_label(),
        permissions,
    })
    .into_response())
}

#[derive(Debug, Serialize)]
struct UserPrefillResponse {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    is_staff: bool,
    is_active: bool,
    last_login: String,
    date_joined: String,
}

/// Raw field JSON for prefilling the edit modal.
#[instrument(skip(state, staff))]
pub async fn fetch(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    let Some(user) = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
    else {
        return Ok(rejection(StatusCode::NOT_FOUND, "Usuario no encontrado."));
    };

    Ok(Json(UserPrefillResponse {
        id: user.id.as_i32(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.as_str().to_string(),
        phone: user.phone.clone().unwrap_or_default(),
        is_staff: user.is_staff,
        is_active: user.is_active,
        last_login: user.last_login_label(),
        date_joined: user.date_joined.format("%d/%m/%Y %H:%M").to_string(),
    })
    .into_response())
}

// =============================================================================
// Toggle
// =============================================================================

#[derive(Debug, Serialize)]
struct ToggleResponse {
    success: bool,
    nuevo_estado: bool,
    mensaje: String,
}

/// Flip an account's active flag.
#[instrument(skip(state, staff))]
pub async fn toggle_active(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<i32>,
) -> Result<Response> {
    ensure_section(&staff, Section::Usuarios)?;

    match UserRepository::new(state.pool())
        .toggle_active(UserId::new(id))
        .await
    {
        Ok(new_state) => {
            tracing::info!(user_id = id, staff_id = %staff.id, new_state, "Account toggled");
            let verb = if new_state { "activado" } else { "desactivado" };
            Ok(Json(ToggleResponse {
                success: true,
                nuevo_estado: new_state,
                mensaje: format!("Usuario {verb} correctamente."),
            })
            .into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(rejection(StatusCode::NOT_FOUND, "Usuario no encontrado."))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_phone_rules() {
        assert!(validate_admin_phone("3001234567").is_ok());
        assert!(validate_admin_phone("1234567").is_ok());
        assert_eq!(
            validate_admin_phone(""),
            Err("El teléfono es obligatorio para administradores.")
        );
        assert!(validate_admin_phone("123456").is_err());
        assert!(validate_admin_phone("1234567890123456").is_err());
        assert!(validate_admin_phone("300-123-45").is_err());
    }

    #[test]
    fn to_bool_accepts_form_truthy_values() {
        assert!(to_bool("true"));
        assert!(to_bool("True"));
        assert!(to_bool("1"));
        assert!(to_bool("on"));
        assert!(!to_bool("false"));
        assert!(!to_bool(""));
    }

    #[test]
    fn section_names_accept_accents() {
        assert_eq!(parse_section_name("Catálogo"), Some(Section::Catalogo));
        assert_eq!(parse_section_name("catalogo"), Some(Section::Catalogo));
        assert_eq!(parse_section_name("Inventario"), Some(Section::Inventario));
        assert_eq!(parse_section_name("contabilidad"), None);
    }
}
