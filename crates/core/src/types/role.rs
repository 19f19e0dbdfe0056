//! User roles and the capability policy.
//!
//! Authorization is a capability check keyed on the role enum: handlers ask
//! the policy whether a role holds a capability exactly once per request,
//! instead of matching on role names inline.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role.
///
/// Stored as lowercase text in the database (`store_user.role` carries a
/// CHECK constraint with the same values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper. No management capabilities.
    #[default]
    User,
    /// Store administrator. Holds every capability.
    Admin,
    /// Store manager. Read-only visibility into user accounts.
    Manager,
}

/// A management capability a role may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, update, and delete catalog products.
    ManageCatalog,
    /// View all orders and advance or delete them.
    ManageOrders,
    /// View, update, and delete user accounts.
    ManageUsers,
    /// List user accounts without modifying them.
    ViewUsers,
}

impl Role {
    /// Whether this role holds the given capability.
    #[must_use]
    pub const fn allows(self, capability: Capability) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => matches!(capability, Capability::ViewUsers),
            Self::User => false,
        }
    }

    /// The lowercase wire/storage name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        for capability in [
            Capability::ManageCatalog,
            Capability::ManageOrders,
            Capability::ManageUsers,
            Capability::ViewUsers,
        ] {
            assert!(Role::Admin.allows(capability));
        }
    }

    #[test]
    fn manager_only_views_users() {
        assert!(Role::Manager.allows(Capability::ViewUsers));
        assert!(!Role::Manager.allows(Capability::ManageUsers));
        assert!(!Role::Manager.allows(Capability::ManageCatalog));
        assert!(!Role::Manager.allows(Capability::ManageOrders));
    }

    #[test]
    fn regular_users_hold_nothing() {
        for capability in [
            Capability::ManageCatalog,
            Capability::ManageOrders,
            Capability::ManageUsers,
            Capability::ViewUsers,
        ] {
            assert!(!Role::User.allows(capability));
        }
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::User, Role::Admin, Role::Manager] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
