//! Authentication middleware and extractors.
//!
//! Resolves the session cookie into a [`CurrentUser`] so handlers receive
//! an already-authenticated identity and never authenticate themselves.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use loomline_core::UserId;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::user::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// Loads the account fresh from the database on every request so role
/// changes and deletions take effect immediately.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(unauthorized)?;

        let user_id: UserId = session
            .get(session_keys::USER_ID)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthorized)?;

        let user = UserRepository::new(state.pool())
            .find(user_id)
            .await
            .map_err(|_| unauthorized())?;

        Ok(Self(CurrentUser::from(&user)))
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("login first to access this resource".to_owned())
}

/// Helper to record the logged-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER_ID, user_id).await
}

/// Helper to clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
