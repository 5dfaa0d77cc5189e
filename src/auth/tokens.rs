// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issuing and verifying the service's own bearer tokens (HS256).

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{claims::JwtClaims, AuthError, AuthenticatedUser};
use crate::config::JwtSettings;
use crate::models::User;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Mints a signed JWT for a user.
#[cfg_attr(test, mockall::automock)]
pub trait TokenMinter: Send + Sync {
    fn create_jwt(&self, user: &User) -> Result<String, AuthError>;
}

/// HS256 token service shared by the login flow and the bearer extractor.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl JwtService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            ttl_secs: settings.expires_in_secs,
        }
    }

    /// Verify signature, expiry and issuer, and return the caller identity.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        Ok(AuthenticatedUser::from_claims(token_data.claims))
    }

    fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }
}

impl TokenMinter for JwtService {
    fn create_jwt(&self, user: &User) -> Result<String, AuthError> {
        let claims = JwtClaims::for_user(user, &self.issuer, Utc::now().timestamp(), self.ttl_secs);
        self.sign(&claims)
    }
}
