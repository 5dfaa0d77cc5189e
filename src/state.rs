// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthenticationService, DidTokenVerifier, JwtService};
use crate::config::{JwtSettings, ThrottleSettings};
use crate::storage::{DocumentStore, UserDatabase};
use crate::throttle::Throttle;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Recipe documents and the audit trail.
    pub storage: Arc<DocumentStore>,
    /// User records.
    pub users: Arc<UserDatabase>,
    /// DID-token login flow.
    pub auth: Arc<AuthenticationService>,
    /// Bearer token verification.
    pub tokens: Arc<JwtService>,
    /// Per-IP limiter for the identity endpoints.
    pub throttle: Arc<Throttle>,
}

impl AppState {
    pub fn new(
        storage: DocumentStore,
        users: UserDatabase,
        verifier: Arc<dyn DidTokenVerifier>,
        jwt: &JwtSettings,
        throttle: &ThrottleSettings,
    ) -> Self {
        let users = Arc::new(users);
        let tokens = Arc::new(JwtService::new(jwt));
        let auth = Arc::new(AuthenticationService::new(
            verifier,
            users.clone(),
            tokens.clone(),
        ));

        Self {
            storage: Arc::new(storage),
            users,
            auth,
            tokens,
            throttle: Arc::new(Throttle::new(throttle)),
        }
    }
}
