//! Authentication route handlers.
//!
//! Signup, login, logout, and the password-reset flow. Credential checks
//! live in the auth service; these handlers only move data between the
//! request, the services, and the session.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use loomline_core::Email;

use crate::db::users::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Source URL of an avatar to pull into media storage.
    pub photo: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password request body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// Response carrying the authenticated user.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
}

/// Plain confirmation response.
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account and log it in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignupRequest>,
) -> Result<Json<AuthResponse>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }

    // Stage the avatar upload first; the account row commits after.
    let staged_photo = match &body.photo {
        Some(source_url) => Some(
            state
                .media()
                .upload(source_url, state.media().user_folder())
                .await?,
        ),
        None => None,
    };

    let auth = AuthService::new(state.pool());
    let registered = auth
        .register(&body.name, &body.email, &body.password, staged_photo.as_ref())
        .await;
    let user = match registered {
        Ok(user) => user,
        Err(err) => {
            if let Some(photo) = staged_photo {
                state.media().destroy_best_effort(&[photo]).await;
            }
            return Err(err.into());
        }
    };

    log_in(&session, &user).await?;
    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&body.email, &body.password).await?;

    log_in(&session, &user).await?;
    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// Log the current session out.
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_sentry_user();

    Ok(Json(MessageResponse {
        success: true,
        message: "logout success".to_owned(),
    }))
}

/// Start the password-reset flow by emailing a one-time link.
///
/// When the email cannot be dispatched, the staged token is cleared again
/// before the upstream error surfaces, so no live token is left behind.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let users = UserRepository::new(state.pool());
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("email not found".to_owned()))?;

    let auth = AuthService::new(state.pool());
    let token = auth.start_password_reset(&user).await?;
    let reset_url = state.config().password_reset_url(&token);

    if let Err(err) = state
        .mailer()
        .send_password_reset(&user.email, &reset_url)
        .await
    {
        auth.clear_password_reset(user.id).await?;
        return Err(err.into());
    }

    Ok(Json(MessageResponse {
        success: true,
        message: format!("email sent to {}", user.email),
    }))
}

/// Finish the password-reset flow with the emailed token.
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .finish_password_reset(&token, &body.password, &body.confirm_password)
        .await?;

    log_in(&session, &user).await?;
    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// Record the user in the session and the error-tracking scope.
async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, user.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
