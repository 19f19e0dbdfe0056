//! Admin and manager user-management route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use loomline_core::{Capability, Email, Role, UserId};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result, or_not_found};
use crate::middleware::{RequireAuth, authorize};
use crate::models::user::User;
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

/// Admin account-update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Response carrying a list of accounts.
#[derive(Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<User>,
}

/// Response carrying one account.
#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// Admin: list every account.
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserListResponse>> {
    authorize(&current, Capability::ManageUsers)?;

    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}

/// Manager: read-only account listing.
pub async fn manager_list(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserListResponse>> {
    authorize(&current, Capability::ViewUsers)?;

    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}

/// Admin: one account's details.
pub async fn admin_get_one(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    authorize(&current, Capability::ManageUsers)?;

    let user = UserRepository::new(state.pool())
        .find(UserId::new(id))
        .await
        .map_err(or_not_found("no user found with this id"))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Admin: update an account's name, email, and role.
pub async fn admin_update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<UserResponse>> {
    authorize(&current, Capability::ManageUsers)?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let user = UserRepository::new(state.pool())
        .update_account(UserId::new(id), &body.name, &email, body.role)
        .await
        .map_err(or_not_found("no user found with this id"))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Admin: delete an account and its stored avatar.
pub async fn admin_delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    authorize(&current, Capability::ManageUsers)?;

    let deleted = UserRepository::new(state.pool())
        .delete(UserId::new(id))
        .await
        .map_err(or_not_found("no user found with this id"))?;

    // The record is gone; the avatar cleanup is best effort.
    if let Some(photo) = deleted.photo {
        state.media().destroy_best_effort(&[photo]).await;
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "user deleted".to_owned(),
    }))
}
