// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Recipe Application Layer
//!
//! Commands (create, update, delete) and queries (get, list) dispatched
//! through [`send`], plus the validation rules applied before any write.

pub mod commands;
pub mod validation;

pub use commands::{
    send, Command, CreateRecipeCommand, DeleteRecipeCommand, GetRecipeQuery, ListRecipesQuery,
    RecipeError, UpdateRecipeCommand,
};
pub use validation::{FieldError, RecipeRequest, ValidationErrors};
