// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passwordless login flow: DID token in, service JWT out.

use std::sync::Arc;

use tracing::{info, warn};

use super::magic::{DidTokenVerifier, MagicUserMetadata};
use super::tokens::TokenMinter;
use super::AuthError;
use crate::models::User;
use crate::storage::{UserDbError, UserStore};

/// Log target for login and logout decisions.
pub const LOG_TARGET: &str = "authentication";

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: User,
    pub token: String,
}

pub struct AuthenticationService {
    verifier: Arc<dyn DidTokenVerifier>,
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenMinter>,
}

impl AuthenticationService {
    pub fn new(
        verifier: Arc<dyn DidTokenVerifier>,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenMinter>,
    ) -> Self {
        Self {
            verifier,
            users,
            tokens,
        }
    }

    /// Verified metadata for the token, or `None` if it was rejected.
    pub async fn authenticate_did_token(
        &self,
        did_token: &str,
    ) -> Result<Option<MagicUserMetadata>, AuthError> {
        Ok(self.verifier.get_metadata(did_token).await?)
    }

    /// Look up a user by email, creating an active member on first login.
    pub fn get_user(&self, email: &str) -> Result<User, AuthError> {
        if let Some(user) = self.users.find_by_email(email)? {
            return Ok(user);
        }

        let user = User::new_member(email);
        match self.users.insert(&user) {
            Ok(()) => {
                info!(target: LOG_TARGET, user_id = %user.id, "Created user on first login");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(UserDbError::AlreadyExists(_)) => self
                .users
                .find_by_email(email)?
                .ok_or_else(|| AuthError::UserStore(format!("user {email} vanished"))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn create_jwt_from_user(&self, user: &User) -> Result<String, AuthError> {
        self.tokens.create_jwt(user)
    }

    /// Revoke every provider session of the token's issuer.
    pub async fn logout(&self, did_token: &str) -> Result<(), AuthError> {
        Ok(self.verifier.logout(did_token).await?)
    }

    /// Exchange a DID token for a service JWT.
    pub async fn authenticate(&self, did_token: &str) -> Result<String, AuthError> {
        self.login(did_token).await.map(|success| success.token)
    }

    /// Same as [`authenticate`](Self::authenticate), keeping the user record.
    pub async fn login(&self, did_token: &str) -> Result<LoginSuccess, AuthError> {
        let email = match self.authenticate_did_token(did_token).await? {
            Some(MagicUserMetadata {
                email: Some(email), ..
            }) if !email.trim().is_empty() => email,
            _ => return Err(self.reject(did_token, AuthError::DidTokenInvalid).await),
        };

        let user = self.get_user(&email)?;
        if !user.is_active {
            return Err(self.reject(did_token, AuthError::UserInactive { email }).await);
        }

        let token = self.create_jwt_from_user(&user)?;
        info!(target: LOG_TARGET, user_id = %user.id, "User authenticated");
        Ok(LoginSuccess { user, token })
    }

    /// Log the rejection, revoke the token, and hand back the error.
    async fn reject(&self, did_token: &str, error: AuthError) -> AuthError {
        info!(target: LOG_TARGET, "{error}");
        if let Err(e) = self.logout(did_token).await {
            warn!(target: LOG_TARGET, error = %e, "Failed to revoke rejected didToken");
        }
        error
    }
}
