//! Account route handlers for the logged-in user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use loomline_core::Email;

use crate::db::users::UserRepository;
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::RequireAuth;
use crate::models::user::User;
use crate::routes::auth::MessageResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Change-password request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub password: String,
}

/// Profile-update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    /// Source URL of a replacement avatar.
    pub photo: Option<String>,
}

/// Response carrying an account.
#[derive(Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub user: User,
}

/// The logged-in user's account details.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<AccountResponse>> {
    let user = UserRepository::new(state.pool())
        .find(current.id)
        .await
        .map_err(or_not_found("no user found with this id"))?;

    Ok(Json(AccountResponse {
        success: true,
        user,
    }))
}

/// Change the logged-in user's password.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool())
        .change_password(current.id, &body.old_password, &body.password)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "password updated".to_owned(),
    }))
}

/// Update the logged-in user's profile.
///
/// A replacement avatar is staged into media storage before the record is
/// written; the old image is only destroyed once the record committed.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let users = UserRepository::new(state.pool());
    let existing = users
        .find(current.id)
        .await
        .map_err(or_not_found("no user found with this id"))?;

    let staged_photo = match &body.photo {
        Some(source_url) => Some(
            state
                .media()
                .upload(source_url, state.media().user_folder())
                .await?,
        ),
        None => None,
    };

    let update = users
        .update_profile(current.id, &body.name, &email, staged_photo.as_ref())
        .await;
    let updated = match update {
        Ok(user) => user,
        Err(err) => {
            if let Some(photo) = staged_photo {
                state.media().destroy_best_effort(&[photo]).await;
            }
            return Err(err.into());
        }
    };

    if staged_photo.is_some()
        && let Some(old_photo) = existing.photo
    {
        state.media().destroy_best_effort(&[old_photo]).await;
    }

    Ok(Json(AccountResponse {
        success: true,
        user: updated,
    }))
}
