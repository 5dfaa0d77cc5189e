// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for write operations.
//!
//! Only the creator of a resource or an admin may modify it.

use crate::auth::AuthenticatedUser;
use crate::models::Recipe;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Resource label used in permission errors.
    fn resource_label(&self) -> String;
}

impl OwnedResource for Recipe {
    fn owner_user_id(&self) -> &str {
        &self.created_by
    }

    fn resource_label(&self) -> String {
        format!("Recipe {}", self.id)
    }
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user may modify this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` unless the user is the owner
    /// or an admin.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id || user.is_admin() {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user.user_id.clone(),
                resource: self.resource_label(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    struct TestResource {
        owner: String,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> &str {
            &self.owner
        }

        fn resource_label(&self) -> String {
            "test resource".to_string()
        }
    }

    fn make_user(user_id: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            roles: vec![role],
            issuer: "test".to_string(),
            expires_at: 0,
        }
    }

    fn resource() -> TestResource {
        TestResource {
            owner: "user_123".to_string(),
        }
    }

    #[test]
    fn owner_passes() {
        assert!(resource()
            .verify_ownership(&make_user("user_123", Role::Member))
            .is_ok());
    }

    #[test]
    fn non_owner_member_is_denied() {
        let result = resource().verify_ownership(&make_user("user_456", Role::Member));
        assert!(matches!(
            result,
            Err(StorageError::PermissionDenied { ref resource, .. }) if resource == "test resource"
        ));
    }

    #[test]
    fn admin_passes_for_any_resource() {
        assert!(resource()
            .verify_ownership(&make_user("admin_1", Role::Admin))
            .is_ok());
    }
}
