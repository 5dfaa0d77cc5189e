// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipe commands and queries.
//!
//! Each request type has exactly one handler (its `execute`). [`send`] always
//! validates first, so a rejected command never touches the repository.

use chrono::Utc;

use super::validation::{validate_id, RecipeRequest, ValidationErrors};
use crate::auth::AuthenticatedUser;
use crate::models::{Image, Ingredient, Instruction, Recipe};
use crate::storage::{DocumentStore, OwnershipEnforcer, RecipeRepository, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A request object with a single handler.
pub trait Command {
    type Output;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    fn execute(self, storage: &DocumentStore) -> Result<Self::Output, RecipeError>;
}

/// Validate, then execute.
pub fn send<C: Command>(command: C, storage: &DocumentStore) -> Result<C::Output, RecipeError> {
    command.validate()?;
    command.execute(storage)
}

/// Copy a validated request body onto `recipe`.
fn apply(recipe: &mut Recipe, request: RecipeRequest) {
    recipe.name = request.name.unwrap_or_default().trim().to_string();
    recipe.cook_time = request
        .cook_time
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default();
    recipe.prep_time = request
        .prep_time
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default();
    recipe.ingredients = request
        .ingredients
        .into_iter()
        .flatten()
        .map(|i| Ingredient {
            name: i.name.unwrap_or_default().trim().to_string(),
            quantity: i.quantity,
            unit: i.unit.filter(|u| !u.trim().is_empty()),
        })
        .collect();
    recipe.instructions = request
        .instructions
        .into_iter()
        .flatten()
        .map(|i| Instruction {
            text: i.text.unwrap_or_default().trim().to_string(),
        })
        .collect();
    recipe.image = request.image.map(|image| Image {
        url: image.url.unwrap_or_default().trim().to_string(),
        alt: image.alt,
    });
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreateRecipeCommand {
    pub created_by: String,
    pub recipe: RecipeRequest,
}

impl Command for CreateRecipeCommand {
    type Output = Recipe;

    fn validate(&self) -> Result<(), ValidationErrors> {
        self.recipe.validate()
    }

    fn execute(self, storage: &DocumentStore) -> Result<Recipe, RecipeError> {
        let now = Utc::now();
        let mut recipe = Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            cook_time: 0,
            prep_time: 0,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            image: None,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        };
        apply(&mut recipe, self.recipe);

        RecipeRepository::new(storage).create(&recipe)?;
        Ok(recipe)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRecipeCommand {
    pub id: String,
    pub actor: AuthenticatedUser,
    pub recipe: RecipeRequest,
}

impl Command for UpdateRecipeCommand {
    type Output = Recipe;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validate_id(&self.id, &mut errors);
        self.recipe.validate_into(&mut errors);
        errors.into_result()
    }

    fn execute(self, storage: &DocumentStore) -> Result<Recipe, RecipeError> {
        let repo = RecipeRepository::new(storage);
        let mut recipe = repo.get(&self.id)?;
        recipe.verify_ownership(&self.actor)?;

        apply(&mut recipe, self.recipe);
        recipe.updated_at = Utc::now();
        repo.update(&recipe)?;
        Ok(recipe)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteRecipeCommand {
    pub id: String,
    pub actor: AuthenticatedUser,
}

impl Command for DeleteRecipeCommand {
    type Output = ();

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validate_id(&self.id, &mut errors);
        errors.into_result()
    }

    fn execute(self, storage: &DocumentStore) -> Result<(), RecipeError> {
        let repo = RecipeRepository::new(storage);
        let recipe = repo.get(&self.id)?;
        recipe.verify_ownership(&self.actor)?;
        repo.delete(&self.id)?;
        Ok(())
    }
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone)]
pub struct GetRecipeQuery {
    pub id: String,
}

impl Command for GetRecipeQuery {
    type Output = Recipe;

    fn execute(self, storage: &DocumentStore) -> Result<Recipe, RecipeError> {
        Ok(RecipeRepository::new(storage).get(&self.id)?)
    }
}

/// All recipes, oldest first, optionally filtered by a case-insensitive
/// substring of the name.
#[derive(Debug, Clone, Default)]
pub struct ListRecipesQuery {
    pub name: Option<String>,
}

impl Command for ListRecipesQuery {
    type Output = Vec<Recipe>;

    fn execute(self, storage: &DocumentStore) -> Result<Vec<Recipe>, RecipeError> {
        let recipes = RecipeRepository::new(storage).list_all()?;
        let needle = self
            .name
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());

        Ok(match needle {
            Some(needle) => recipes
                .into_iter()
                .filter(|r| r.name.to_lowercase().contains(&needle))
                .collect(),
            None => recipes,
        })
    }
}
