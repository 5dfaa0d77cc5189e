// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Persisted entities shared by the storage layer and the HTTP API. All types
//! derive `Serialize`, `Deserialize`, and `ToSchema` and use camelCase on the
//! wire to match the web client.
//!
//! ## Model Categories
//!
//! - **Users**: identity records created on first passwordless login
//! - **Recipes**: recipes with ordered ingredients and instructions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// =============================================================================
// User Models
// =============================================================================

/// A user identity record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier (UUID).
    pub id: String,
    /// Display name, defaults to the local part of the email.
    pub username: String,
    /// Verified email address.
    pub email: String,
    /// Granted roles.
    pub roles: Vec<Role>,
    /// Inactive users cannot log in.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New active member derived from a verified email address.
    pub fn new_member(email: &str) -> Self {
        let now = Utc::now();
        let username = email
            .split_once('@')
            .map(|(local, _)| local)
            .filter(|local| !local.is_empty())
            .unwrap_or(email)
            .to_string();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email: email.to_string(),
            roles: vec![Role::Member],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.has_privilege(role))
    }
}

// =============================================================================
// Recipe Models
// =============================================================================

/// A single ingredient line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// One preparation step. Position in the list is the step number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub text: String,
}

/// Reference to a recipe image hosted elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A stored recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe identifier (UUID).
    pub id: String,
    pub name: String,
    /// Cooking time in minutes.
    pub cook_time: u32,
    /// Preparation time in minutes.
    pub prep_time: u32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// User ID of the creator.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
