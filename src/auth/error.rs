// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::magic::VerifierError;
use crate::storage::UserDbError;

/// Authentication error type.
///
/// Covers both bearer-token verification on protected routes and the
/// DID-token login flow. The `Display` text of `DidTokenInvalid` and
/// `UserInactive` is exactly what the login flow logs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthHeader,

    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token issuer is invalid")]
    InvalidIssuer,

    #[error("Token is not yet valid")]
    TokenNotYetValid,

    #[error("didToken invalid.")]
    DidTokenInvalid,

    #[error("User with email {email} is inactive.")]
    UserInactive { email: String },

    #[error("didToken could not be decoded")]
    MalformedDidToken,

    #[error("Identity provider error: {0}")]
    Verifier(String),

    #[error("Failed to issue token: {0}")]
    TokenCreation(String),

    #[error("User store error: {0}")]
    UserStore(String),

    #[error("Account is inactive or no longer exists")]
    AccountDisabled,

    #[error("Insufficient permissions for this operation")]
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::DidTokenInvalid | AuthError::UserInactive { .. } => "unauthorized",
            AuthError::MalformedDidToken => "malformed_did_token",
            AuthError::Verifier(_) => "identity_provider_error",
            AuthError::TokenCreation(_) | AuthError::UserStore(_) => "internal_error",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer
            | AuthError::TokenNotYetValid
            | AuthError::AccountDisabled
            | AuthError::DidTokenInvalid
            | AuthError::UserInactive { .. } => StatusCode::UNAUTHORIZED,
            AuthError::MalformedDidToken => StatusCode::BAD_REQUEST,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::Verifier(_) => StatusCode::BAD_GATEWAY,
            AuthError::TokenCreation(_) | AuthError::UserStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the client.
    ///
    /// Login rejections collapse to one message so a caller cannot tell an
    /// invalid token from a deactivated account.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::DidTokenInvalid | AuthError::UserInactive { .. } => {
                "Unauthorized".to_string()
            }
            AuthError::TokenCreation(_) | AuthError::UserStore(_) => {
                "Internal authentication error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<VerifierError> for AuthError {
    fn from(e: VerifierError) -> Self {
        match e {
            VerifierError::MalformedToken(_) => AuthError::MalformedDidToken,
            other => AuthError::Verifier(other.to_string()),
        }
    }
}

impl From<UserDbError> for AuthError {
    fn from(e: UserDbError) -> Self {
        AuthError::UserStore(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
