// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Passwordless login through Magic DID tokens, exchanged for this service's
//! own HS256 JWTs.
//!
//! ## Auth Flow
//!
//! 1. The web client signs the user in with Magic and receives a DID token
//! 2. The client posts it to `/authenticate`
//! 3. The server:
//!    - Validates the DID token locally (expiry, signature over the claim)
//!    - Fetches the user's metadata from the Magic admin API
//!    - Finds or creates the user record and checks it is active
//!    - Returns a signed JWT carrying `sub`, email and roles
//! 4. The client sends `Authorization: Bearer <jwt>` to the recipe API
//!
//! Rejected logins revoke the DID token's sessions before returning 401.
//! Clock skew tolerance for bearer tokens is 60 seconds.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod magic;
pub mod roles;
pub mod service;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
#[cfg(test)]
pub use magic::MockDidTokenVerifier;
pub use magic::{DidTokenVerifier, MagicClient, MagicUserMetadata, VerifierError};
pub use roles::Role;
pub use service::{AuthenticationService, LoginSuccess};
pub use tokens::{JwtService, TokenMinter};
