//! Staff login and logout.
//!
//! Credentials are checked against the same `usuarios` table the
//! storefront writes; only active staff accounts may enter. The
//! permission flags are loaded once at login and carried in the session,
//! so an edit to someone's flags applies from their next login.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use liher_core::{Email, password};

use crate::db::{PermissionRepository, UserRepository};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_staff, set_current_staff};
use crate::models::{CurrentStaff, session_keys};
use crate::routes::FlashQuery;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the login page.
#[instrument(skip(session))]
pub async fn login_page(session: Session, Query(query): Query<FlashQuery>) -> Result<Response> {
    let logged_in: Option<CurrentStaff> = session.get(session_keys::CURRENT_STAFF).await?;
    if logged_in.is_some() {
        return Ok(Redirect::to("/panel").into_response());
    }

    Ok(LoginTemplate {
        email: String::new(),
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

fn login_error(email: &str, message: &str) -> Response {
    LoginTemplate {
        email: email.to_string(),
        error: Some(message.to_string()),
        success: None,
        warning: None,
    }
    .into_response()
}

/// Handle the login form.
#[instrument(skip(state, session, form))]
pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    let password_input = form.password.as_str();

    if email.is_empty() || password_input.is_empty() {
        return Ok(login_error(&email, "Correo y contraseña son obligatorios."));
    }

    let Ok(parsed) = Email::parse(&email) else {
        return Ok(login_error(&email, "Correo o contraseña incorrectos."));
    };

    let users = UserRepository::new(state.pool());
    let Some((user, password_hash)) = users.get_with_password_hash(&parsed).await? else {
        return Ok(login_error(&email, "Correo o contraseña incorrectos."));
    };

    if !password::verify(password_input, &password_hash) {
        return Ok(login_error(&email, "Correo o contraseña incorrectos."));
    }

    if !user.is_active {
        return Ok(login_error(&email, "Tu cuenta está inactiva."));
    }

    if !user.is_staff && !user.is_superuser {
        tracing::warn!(user_id = %user.id, "Non-staff login attempt on the panel");
        return Ok(login_error(
            &email,
            "Esta cuenta no tiene acceso al panel de administración.",
        ));
    }

    let permissions = PermissionRepository::new(state.pool()).get(user.id).await?;

    let staff = CurrentStaff {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_superuser: user.is_superuser,
        permissions,
    };
    set_current_staff(&session, &staff).await?;
    users.touch_last_login(user.id).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(staff_id = %user.id, "Staff logged in");

    Ok(Redirect::to("/panel").into_response())
}

/// Log out and return to the login page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_staff(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}
