// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::models::User;

/// Claims carried by tokens issued from `/authenticate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Issuer
    pub iss: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl JwtClaims {
    /// Build claims for `user` valid from `issued_at` for `ttl_secs`.
    pub fn for_user(user: &User, issuer: &str, issued_at: i64, ttl_secs: u64) -> Self {
        Self {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            iss: issuer.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs as i64),
        }
    }
}

/// Authenticated user information extracted from a verified JWT.
///
/// This is the type handlers receive through the `Auth` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,

    /// Original issuer (not serialized)
    #[serde(skip)]
    pub issuer: String,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    pub fn from_claims(claims: JwtClaims) -> Self {
        let roles = if claims.roles.is_empty() {
            vec![Role::default()]
        } else {
            claims.roles
        };

        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
            roles,
            issuer: claims.iss,
            expires_at: claims.exp,
        }
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.roles.iter().any(|r| r.has_privilege(required))
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
