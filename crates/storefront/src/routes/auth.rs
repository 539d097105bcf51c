//! Authentication routes: login, registration, activation and password
//! reset.
//!
//! The form endpoints redirect with flash messages; `/login-ajax` and
//! `/ajax/validar-email` answer JSON for the login modal. Activation and
//! reset links are signed by [`liher_core::tokens`] and
//! arrive by email.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use liher_core::Email;

use crate::db::users::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::session::{CurrentUser, keys};
use crate::routes::{FlashQuery, redirect_error, redirect_success, redirect_warning};
use crate::services::auth::{AuthError, AuthService, verify_password};
use crate::state::AppState;

/// Seconds the register-review page waits before offering a resend.
const ACTIVATION_RESEND_SECONDS: u32 = 30;

/// Seconds the reset-sent page waits before offering a resend.
const RESET_RESEND_SECONDS: u32 = 360;

// =============================================================================
// Login and logout
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the login page.
#[instrument(skip(user))]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<FlashQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        user: None,
        email: String::new(),
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response()
}

fn login_error(email: &str, message: &str) -> Response {
    LoginTemplate {
        user: None,
        email: email.to_string(),
        error: Some(message.to_string()),
        success: None,
        warning: None,
    }
    .into_response()
}

/// Auto-send a fresh activation link when an inactive account tries to
/// log in, then park the buyer on the review page.
async fn redirect_inactive_to_review(state: &AppState, email: &str) -> Response {
    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    let review_path = format!("/registro/revisar/{}", urlencoding::encode(email));

    let sent = match Email::parse(email) {
        Ok(parsed) => match UserRepository::new(state.pool()).get_by_email(&parsed).await {
            Ok(Some(user)) => {
                let (uid, token) = auth.activation_link_parts(&user);
                state
                    .email()
                    .send_activation_email(email, &user.first_name, &uid, &token)
                    .await
                    .is_ok()
            }
            _ => false,
        },
        Err(_) => false,
    };

    let warning = if sent {
        "Tu cuenta no ha sido activada. Revisa tu correo. Se ha enviado un enlace de activación."
    } else {
        "No se pudo enviar el correo de activación. Intenta reenviarlo manualmente."
    };
    redirect_warning(&review_path, warning).into_response()
}

/// Handle the login form.
#[instrument(skip(state, session, form))]
pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    let password = form.password.as_str();

    if email.is_empty() || password.is_empty() {
        return Ok(login_error(&email, "Correo y contraseña son obligatorios."));
    }

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    match auth.login(&email, password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User logged in");

            if user.is_staff {
                Ok(Redirect::to(&state.config().admin_base_url).into_response())
            } else {
                Ok(redirect_success("/", &format!("Bienvenido {}", user.email)).into_response())
            }
        }
        Err(AuthError::AccountInactive) => Ok(redirect_inactive_to_review(&state, &email).await),
        Err(
            AuthError::InvalidCredentials | AuthError::InvalidEmail(_) | AuthError::UserNotFound,
        ) => Ok(login_error(&email, "Correo o contraseña incorrectos.")),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginAjaxResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn login_ajax_failure(message: &str) -> Json<LoginAjaxResponse> {
    Json(LoginAjaxResponse {
        success: false,
        message: Some(message.to_string()),
    })
}

/// JSON login for the modal. Inactive accounts are rejected like wrong
/// credentials; the full page handles the activation resend.
#[instrument(skip(state, session, body))]
pub async fn login_ajax(
    State(state): State<AppState>,
    session: Session,
    body: Option<Json<LoginBody>>,
) -> Result<Response> {
    let Some(Json(body)) = body else {
        return Ok(login_ajax_failure("Datos inválidos.").into_response());
    };

    let email = body.email.unwrap_or_default().trim().to_lowercase();
    let password = body.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Ok(login_ajax_failure("Correo y contraseña son obligatorios.").into_response());
    }

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    match auth.login(&email, &password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User logged in");
            Ok(Json(LoginAjaxResponse {
                success: true,
                message: None,
            })
            .into_response())
        }
        Err(
            AuthError::InvalidCredentials
            | AuthError::InvalidEmail(_)
            | AuthError::UserNotFound
            | AuthError::AccountInactive,
        ) => Ok(login_ajax_failure("Correo o contraseña incorrectos.").into_response()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateEmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateEmailResponse {
    pub exists: bool,
}

/// Tell the registration form whether an email is already taken.
#[instrument(skip(state))]
pub async fn validate_email_ajax(
    State(state): State<AppState>,
    Query(query): Query<ValidateEmailQuery>,
) -> Result<Json<ValidateEmailResponse>> {
    let exists = match query.email.as_deref().map(Email::parse) {
        Some(Ok(email)) => UserRepository::new(state.pool())
            .get_by_email(&email)
            .await?
            .is_some(),
        _ => false,
    };
    Ok(Json(ValidateEmailResponse { exists }))
}

/// Log out and drop the whole session, cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(redirect_success("/", "Has cerrado sesión correctamente."))
}

// =============================================================================
// Registration and activation
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub form: RegisterForm,
    pub error: Option<String>,
}

/// Display the registration form.
#[instrument(skip(user))]
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate {
        user: None,
        form: RegisterForm::default(),
        error: None,
    }
    .into_response()
}

fn register_error(form: RegisterForm, message: &str) -> Response {
    RegisterTemplate {
        user: None,
        form,
        error: Some(message.to_string()),
    }
    .into_response()
}

/// Create the inactive account and email the activation link.
#[instrument(skip(state, form))]
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.nombre.trim().is_empty()
        || form.apellido.trim().is_empty()
        || form.email.trim().is_empty()
        || form.password1.is_empty()
        || form.password2.is_empty()
    {
        return Ok(register_error(form, "Todos los campos son obligatorios."));
    }

    let email = form.email.trim().to_lowercase();
    let auth = AuthService::new(state.pool(), &state.config().token_secret);

    let user = match auth
        .register(
            &email,
            &form.nombre,
            &form.apellido,
            &form.password1,
            &form.password2,
        )
        .await
    {
        Ok(user) => user,
        Err(AuthError::UserAlreadyExists) => {
            return Ok(register_error(
                form,
                "Ya existe una cuenta con ese correo.",
            ));
        }
        Err(AuthError::InvalidEmail(_)) => {
            return Ok(register_error(
                form,
                "Ingresa un correo electrónico válido.",
            ));
        }
        Err(AuthError::WeakPassword(message)) => {
            return Ok(register_error(form, &message));
        }
        Err(AuthError::PasswordMismatch) => {
            return Ok(register_error(form, "Las contraseñas no coinciden."));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "User registered, pending activation");

    let (uid, token) = auth.activation_link_parts(&user);
    let review_path = format!("/registro/revisar/{}", urlencoding::encode(&email));

    match state
        .email()
        .send_activation_email(&email, &user.first_name, &uid, &token)
        .await
    {
        Ok(()) => Ok(redirect_success(
            &review_path,
            "Te hemos enviado un correo para activar tu cuenta.",
        )
        .into_response()),
        Err(e) => {
            tracing::error!("Failed to send activation email: {e}");
            Ok(redirect_warning(
                &review_path,
                "No se pudo enviar el correo de activación. Intenta reenviarlo manualmente.",
            )
            .into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub admin: Option<bool>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Check-your-inbox page shown after registration.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_review.html")]
pub struct RegisterReviewTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub resend_seconds: u32,
    pub from_admin: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
}

/// Display the check-your-inbox page for a pending account.
#[instrument(skip(state, user))]
pub async fn register_review(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(email): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Result<Response> {
    let Ok(parsed) = Email::parse(&email) else {
        return Ok(redirect_error("/acceso", "El usuario no existe.").into_response());
    };
    if UserRepository::new(state.pool())
        .get_by_email(&parsed)
        .await?
        .is_none()
    {
        return Ok(redirect_error("/acceso", "El usuario no existe.").into_response());
    }

    Ok(RegisterReviewTemplate {
        user,
        email: parsed.as_str().to_string(),
        resend_seconds: ACTIVATION_RESEND_SECONDS,
        from_admin: query.admin.unwrap_or(false),
        error: query.error,
        success: query.success,
        warning: query.warning,
    }
    .into_response())
}

/// Resend the activation email for a pending account.
#[instrument(skip(state))]
pub async fn resend_activation(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Redirect> {
    let pending = match Email::parse(&email) {
        Ok(parsed) => UserRepository::new(state.pool())
            .get_by_email(&parsed)
            .await?
            .filter(|user| !user.is_active),
        Err(_) => None,
    };

    let Some(user) = pending else {
        return Ok(redirect_error(
            "/acceso",
            "No encontramos un usuario pendiente de activar con ese correo.",
        ));
    };

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    let (uid, token) = auth.activation_link_parts(&user);
    let review_path = format!("/registro/revisar/{}", urlencoding::encode(&email));

    match state
        .email()
        .send_activation_email(user.email.as_str(), &user.first_name, &uid, &token)
        .await
    {
        Ok(()) => Ok(redirect_success(
            &review_path,
            "El correo de activación ha sido reenviado.",
        )),
        Err(e) => {
            tracing::error!("Failed to resend activation email: {e}");
            Ok(redirect_warning(
                &review_path,
                "No se pudo enviar el correo de activación. Intenta reenviarlo manualmente.",
            ))
        }
    }
}

/// Invalid activation link page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/activation_invalid.html")]
pub struct ActivationInvalidTemplate {
    pub user: Option<CurrentUser>,
}

/// Activate an account from an emailed link and log the user in.
#[instrument(skip(state, session))]
pub async fn activate(
    State(state): State<AppState>,
    session: Session,
    Path((uid, token)): Path<(String, String)>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), &state.config().token_secret);

    let user = match auth.activate(&uid, &token).await {
        Ok(user) => user,
        Err(AuthError::InvalidToken) => {
            return Ok(ActivationInvalidTemplate { user: None }.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Account activated");

    if user.is_staff {
        return Ok(Redirect::to(&state.config().admin_base_url).into_response());
    }

    let greeting = if user.first_name.trim().is_empty() {
        user.email.as_str().to_string()
    } else {
        user.first_name.clone()
    };
    Ok(redirect_success("/", &format!("Bienvenido, {greeting}!")).into_response())
}

// =============================================================================
// Password reset
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequestForm {
    #[serde(default)]
    pub email: String,
}

/// Password reset request page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_request.html")]
pub struct PasswordResetRequestTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// Display the reset request form.
#[instrument(skip(user))]
pub async fn password_reset_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<FlashQuery>,
) -> PasswordResetRequestTemplate {
    PasswordResetRequestTemplate {
        user,
        error: query.error,
    }
}

/// Send the reset email. The response never reveals whether the account
/// exists.
#[instrument(skip(state, session, form))]
pub async fn password_reset_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetRequestForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(PasswordResetRequestTemplate {
            user: None,
            error: Some("Ingresa tu correo electrónico.".to_string()),
        }
        .into_response());
    }

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    match auth.start_password_reset(&email).await {
        Ok(Some((user, uid, token))) => {
            if let Err(e) = state
                .email()
                .send_password_reset_email(user.email.as_str(), &user.first_name, &uid, &token)
                .await
            {
                tracing::error!("Failed to send password reset email: {e}");
            }
        }
        Ok(None) => {
            tracing::info!("Password reset requested for unknown email");
        }
        Err(AuthError::InvalidEmail(_)) => {
            return Ok(PasswordResetRequestTemplate {
                user: None,
                error: Some("Ingresa un correo electrónico válido.".to_string()),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    }

    session.insert(keys::RESET_EMAIL, &email).await?;
    Ok(Redirect::to("/correo-enviado").into_response())
}

/// Reset-email-sent page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_sent.html")]
pub struct PasswordResetSentTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub resend_seconds: u32,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the reset-email-sent page.
#[instrument(skip(session, user))]
pub async fn password_reset_sent(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<FlashQuery>,
) -> Response {
    let Some(email) = session
        .get::<String>(keys::RESET_EMAIL)
        .await
        .ok()
        .flatten()
    else {
        return Redirect::to("/restablecer-contrasena").into_response();
    };

    PasswordResetSentTemplate {
        user,
        email,
        resend_seconds: RESET_RESEND_SECONDS,
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Resend the password reset email to the address kept in the session.
#[instrument(skip(state, session))]
pub async fn resend_reset(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let Some(email) = session
        .get::<String>(keys::RESET_EMAIL)
        .await
        .ok()
        .flatten()
    else {
        return Ok(redirect_error(
            "/restablecer-contrasena",
            "Tu sesión ha expirado. Ingresa nuevamente tu correo para reenviar el enlace.",
        ));
    };

    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    if let Ok(Some((user, uid, token))) = auth.start_password_reset(&email).await {
        if let Err(e) = state
            .email()
            .send_password_reset_email(user.email.as_str(), &user.first_name, &uid, &token)
            .await
        {
            tracing::error!("Failed to resend password reset email: {e}");
            return Ok(redirect_error(
                "/correo-enviado",
                "No se pudo reenviar el correo. Intenta más tarde.",
            ));
        }
    }

    Ok(redirect_success(
        "/correo-enviado",
        "El correo de restablecimiento se ha reenviado exitosamente.",
    ))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPasswordForm {
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// New password form behind an emailed reset link.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_form.html")]
pub struct PasswordResetFormTemplate {
    pub user: Option<CurrentUser>,
    pub uid: String,
    pub token: String,
    pub error: Option<String>,
}

/// Display the new password form if the link is valid.
#[instrument(skip(state))]
pub async fn new_password_page(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), &state.config().token_secret);
    match auth.check_reset_token(&uid, &token).await {
        Ok(_) => Ok(PasswordResetFormTemplate {
            user: None,
            uid,
            token,
            error: None,
        }
        .into_response()),
        Err(AuthError::InvalidToken) => Ok(redirect_error(
            "/restablecer-contrasena",
            "El enlace de restablecimiento es inválido o ha expirado.",
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Set the new password and finish the reset.
#[instrument(skip(state, session, form))]
pub async fn new_password_submit(
    State(state): State<AppState>,
    session: Session,
    Path((uid, token)): Path<(String, String)>,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), &state.config().token_secret);

    let user = match auth.check_reset_token(&uid, &token).await {
        Ok(user) => user,
        Err(AuthError::InvalidToken) => {
            return Ok(redirect_error(
                "/restablecer-contrasena",
                "El enlace de restablecimiento es inválido o ha expirado.",
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let rerender = |error: &str| {
        PasswordResetFormTemplate {
            user: None,
            uid: uid.clone(),
            token: token.clone(),
            error: Some(error.to_string()),
        }
        .into_response()
    };

    let current_hash = UserRepository::new(state.pool())
        .get_password_hash(user.id)
        .await?;
    if verify_password(&form.password1, &current_hash).is_ok() {
        return Ok(rerender(
            "La nueva contraseña no puede ser igual a la anterior.",
        ));
    }

    match auth
        .reset_password(&uid, &token, &form.password1, &form.password2)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Password reset completed");
            if let Err(e) = session.remove::<String>(keys::RESET_EMAIL).await {
                tracing::error!("Failed to clear reset email from session: {e}");
            }
            Ok(Redirect::to("/contrasena-actualizada").into_response())
        }
        Err(AuthError::WeakPassword(message)) => Ok(rerender(&message)),
        Err(AuthError::PasswordMismatch) => Ok(rerender("Las contraseñas no coinciden.")),
        Err(AuthError::InvalidToken) => Ok(redirect_error(
            "/restablecer-contrasena",
            "El enlace de restablecimiento es inválido o ha expirado.",
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Password-updated confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_done.html")]
pub struct PasswordResetDoneTemplate {
    pub user: Option<CurrentUser>,
}

/// Display the password-updated confirmation.
#[instrument(skip(user))]
pub async fn password_reset_done(OptionalAuth(user): OptionalAuth) -> PasswordResetDoneTemplate {
    PasswordResetDoneTemplate { user }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_ajax_failure_serializes_message() {
        let Json(body) = login_ajax_failure("Correo o contraseña incorrectos.");
        let json = serde_json::to_value(&body).expect("serializable");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Correo o contraseña incorrectos.");
    }

    #[test]
    fn login_ajax_success_omits_message() {
        let json = serde_json::to_value(LoginAjaxResponse {
            success: true,
            message: None,
        })
        .expect("serializable");
        assert_eq!(json["success"], true);
        assert!(json.get("message").is_none());
    }
}
