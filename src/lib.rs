// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipes Server - Recipe API with Passwordless Identity
//!
//! Users sign in with a Magic DID token and receive a JWT signed by this
//! service. The same JWT authorizes the recipe endpoints.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - DID-token login, JWT issuance and bearer extraction
//! - `recipes` - Recipe commands, queries and validation
//! - `storage` - JSON recipe documents, redb user database, audit trail
//! - `throttle` - Per-IP throttling of the identity endpoints

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod recipes;
pub mod state;
pub mod storage;
pub mod throttle;
