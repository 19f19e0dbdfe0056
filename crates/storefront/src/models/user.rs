//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomline_core::{Email, Role, UserId};

use super::product::PhotoRef;

/// Session keys used by the auth middleware.
pub mod session_keys {
    /// The logged-in user's id.
    pub const USER_ID: &str = "loomline.user_id";
}

/// A storefront account.
///
/// The password hash never leaves the repository layer; this type is safe
/// to serialize into responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub photo: Option<PhotoRef>,
    pub created_at: DateTime<Utc>,
}

/// The already-authenticated identity handed to handlers by the auth
/// middleware. Handlers never authenticate; they only receive this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
