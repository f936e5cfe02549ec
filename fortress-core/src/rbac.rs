//! Static role-based access control tables.
//!
//! Four roles with fixed permission sets and a priority used to resolve
//! which of several roles "wins". The tables are compile-time constants;
//! nothing here touches storage.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A permission consulted by route handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:manage")]
    UsersManage,
    #[serde(rename = "content:read")]
    ContentRead,
    #[serde(rename = "content:write")]
    ContentWrite,
    #[serde(rename = "content:moderate")]
    ContentModerate,
    #[serde(rename = "billing:manage")]
    BillingManage,
    #[serde(rename = "audit:read")]
    AuditRead,
}

/// The four static roles, ordered by capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
    Viewer,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::UsersRead,
    Permission::UsersManage,
    Permission::ContentRead,
    Permission::ContentWrite,
    Permission::ContentModerate,
    Permission::BillingManage,
    Permission::AuditRead,
];

const MODERATOR_PERMISSIONS: &[Permission] = &[
    Permission::UsersRead,
    Permission::ContentRead,
    Permission::ContentWrite,
    Permission::ContentModerate,
];

const USER_PERMISSIONS: &[Permission] = &[Permission::ContentRead, Permission::ContentWrite];

const VIEWER_PERMISSIONS: &[Permission] = &[Permission::ContentRead];

impl Role {
    /// Priority for role resolution; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Role::Admin => 4,
            Role::Moderator => 3,
            Role::User => 2,
            Role::Viewer => 1,
        }
    }

    /// The static permission set for this role.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Moderator => MODERATOR_PERMISSIONS,
            Role::User => USER_PERMISSIONS,
            Role::Viewer => VIEWER_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            "viewer" => Ok(Role::Viewer),
            other => Err(ValidationError::InvalidField(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// Resolve the strongest role among `roles` by priority.
///
/// Exact ties keep the first role encountered, so argument order breaks
/// them. Returns `None` for an empty iterator.
pub fn highest_role(roles: impl IntoIterator<Item = Role>) -> Option<Role> {
    roles.into_iter().reduce(|best, candidate| {
        if candidate.priority() > best.priority() {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_permission() {
        for permission in [
            Permission::UsersRead,
            Permission::UsersManage,
            Permission::ContentRead,
            Permission::ContentWrite,
            Permission::ContentModerate,
            Permission::BillingManage,
            Permission::AuditRead,
        ] {
            assert!(Role::Admin.has_permission(permission));
        }
    }

    #[test]
    fn test_viewer_cannot_manage_users() {
        assert!(!Role::Viewer.has_permission(Permission::UsersManage));
        assert!(Role::Viewer.has_permission(Permission::ContentRead));
        assert!(!Role::Viewer.has_permission(Permission::ContentWrite));
    }

    #[test]
    fn test_has_all_and_any() {
        let set = [Permission::ContentRead, Permission::ContentModerate];
        assert!(Role::Moderator.has_all_permissions(&set));
        assert!(!Role::User.has_all_permissions(&set));
        assert!(Role::User.has_any_permission(&set));
        assert!(!Role::Viewer.has_any_permission(&[Permission::UsersManage]));

        // Vacuously true/false on the empty set.
        assert!(Role::Viewer.has_all_permissions(&[]));
        assert!(!Role::Viewer.has_any_permission(&[]));
    }

    #[test]
    fn test_highest_role() {
        assert_eq!(highest_role([Role::User, Role::Admin]), Some(Role::Admin));
        assert_eq!(
            highest_role([Role::Moderator, Role::Viewer, Role::User]),
            Some(Role::Moderator)
        );
        let empty: [Role; 0] = [];
        assert_eq!(highest_role(empty), None);

        // First argument wins an exact tie.
        assert_eq!(highest_role([Role::User, Role::User]), Some(Role::User));
    }

    #[test]
    fn test_role_string_round_trip() {
        for role in [Role::Admin, Role::Moderator, Role::User, Role::Viewer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_permission_serde_names() {
        let json = serde_json::to_string(&Permission::UsersManage).unwrap();
        assert_eq!(json, "\"users:manage\"");
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
