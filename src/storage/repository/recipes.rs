// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipe repository.
//!
//! Each recipe is stored as a separate JSON file under `recipes/`.

use std::path::PathBuf;

use crate::models::Recipe;

use super::super::{DocumentStore, StorageError, StorageResult};

/// Repository for recipe documents.
pub struct RecipeRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> RecipeRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    /// Ids double as file names, so anything that is not a UUID cannot exist.
    /// Every spelling of a UUID maps to its lowercase hyphenated file.
    fn path_for(&self, recipe_id: &str) -> StorageResult<PathBuf> {
        let id = uuid::Uuid::parse_str(recipe_id)
            .map_err(|_| StorageError::NotFound(format!("Recipe {recipe_id}")))?;
        Ok(self.storage.paths().recipe(&id.hyphenated().to_string()))
    }

    pub fn exists(&self, recipe_id: &str) -> bool {
        self.path_for(recipe_id)
            .map(|path| self.storage.exists(path))
            .unwrap_or(false)
    }

    pub fn get(&self, recipe_id: &str) -> StorageResult<Recipe> {
        let path = self.path_for(recipe_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Recipe {recipe_id}")));
        }
        self.storage.read_json(path)
    }

    pub fn create(&self, recipe: &Recipe) -> StorageResult<()> {
        let path = self.path_for(&recipe.id)?;
        if self.storage.exists(&path) {
            return Err(StorageError::AlreadyExists(format!("Recipe {}", recipe.id)));
        }
        self.storage.write_json(path, recipe)
    }

    pub fn update(&self, recipe: &Recipe) -> StorageResult<()> {
        let path = self.path_for(&recipe.id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Recipe {}", recipe.id)));
        }
        self.storage.write_json(path, recipe)
    }

    pub fn delete(&self, recipe_id: &str) -> StorageResult<()> {
        let path = self.path_for(recipe_id)?;
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Recipe {recipe_id}")));
        }
        self.storage.delete(path)
    }

    /// All recipes, oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<Recipe>> {
        let recipe_ids = self
            .storage
            .list_files(self.storage.paths().recipes_dir(), "json")?;

        let mut recipes = Vec::with_capacity(recipe_ids.len());
        for id in recipe_ids {
            match self.get(&id) {
                Ok(recipe) => recipes.push(recipe),
                Err(e) => tracing::warn!(recipe_id = %id, error = %e, "Skipping unreadable recipe"),
            }
        }

        recipes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(recipes)
    }
}
