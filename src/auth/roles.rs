// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Manages users and may edit any recipe
/// - `Member` - Normal user, edits own recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Regular signed-in user
    Member,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Member, Role::Member) => true,
            _ => false,
        }
    }
}

impl Default for Role {
    /// Least privilege for authenticated users.
    fn default() -> Self {
        Role::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Member));
    }

    #[test]
    fn member_only_has_member_privilege() {
        assert!(!Role::Member.has_privilege(Role::Admin));
        assert!(Role::Member.has_privilege(Role::Member));
    }

    #[test]
    fn default_role_is_member() {
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let parsed: Role = serde_json::from_str(r#""member""#).unwrap();
        assert_eq!(parsed, Role::Member);
    }
}
