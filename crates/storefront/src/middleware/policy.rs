//! The role-capability policy.
//!
//! Handlers that guard a management surface call [`authorize`] exactly
//! once at the top; the capability matrix itself lives on
//! [`loomline_core::Role`].

use loomline_core::Capability;

use crate::error::AppError;
use crate::models::user::CurrentUser;

/// Check that the current user's role holds a capability.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the role does not hold it.
pub fn authorize(user: &CurrentUser, capability: Capability) -> Result<(), AppError> {
    if user.role.allows(capability) {
        return Ok(());
    }

    Err(AppError::Forbidden(
        "you are not allowed to access this resource".to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use loomline_core::{Email, Role, UserId};

    use super::*;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            name: "Test User".to_owned(),
            email: Email::parse("test@example.com").expect("valid email"),
            role,
        }
    }

    #[test]
    fn admin_passes_every_check() {
        let admin = user_with_role(Role::Admin);
        assert!(authorize(&admin, Capability::ManageCatalog).is_ok());
        assert!(authorize(&admin, Capability::ManageOrders).is_ok());
        assert!(authorize(&admin, Capability::ManageUsers).is_ok());
        assert!(authorize(&admin, Capability::ViewUsers).is_ok());
    }

    #[test]
    fn manager_only_passes_view_users() {
        let manager = user_with_role(Role::Manager);
        assert!(authorize(&manager, Capability::ViewUsers).is_ok());
        assert!(matches!(
            authorize(&manager, Capability::ManageUsers),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn regular_user_is_forbidden() {
        let user = user_with_role(Role::User);
        assert!(matches!(
            authorize(&user, Capability::ManageCatalog),
            Err(AppError::Forbidden(_))
        ));
    }
}
