// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    models::Recipe,
    recipes::{
        send, CreateRecipeCommand, DeleteRecipeCommand, GetRecipeQuery, ListRecipesQuery,
        RecipeRequest, UpdateRecipeCommand,
    },
    state::AppState,
    storage::AuditEventType,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecipeListParams {
    /// Case-insensitive substring of the recipe name.
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/recipes",
    params(RecipeListParams),
    tag = "Recipes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipes, oldest first", body = [Recipe]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_recipes(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = send(ListRecipesQuery { name: params.name }, &state.storage)?;
    Ok(Json(recipes))
}

#[utoipa::path(
    post,
    path = "/v1/recipes",
    request_body = RecipeRequest,
    tag = "Recipes",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Recipe created", body = Recipe),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_recipe(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = send(
        CreateRecipeCommand {
            created_by: user.user_id.clone(),
            recipe: request,
        },
        &state.storage,
    )?;

    tracing::info!(recipe_id = %recipe.id, user_id = %user.user_id, "Recipe created");
    audit_log!(&state.storage, AuditEventType::RecipeCreated, user, "recipe", &recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[utoipa::path(
    get,
    path = "/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe identifier")),
    tag = "Recipes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipe", body = Recipe),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn get_recipe(
    Auth(_user): Auth,
    Path(recipe_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = send(GetRecipeQuery { id: recipe_id }, &state.storage)?;
    Ok(Json(recipe))
}

#[utoipa::path(
    put,
    path = "/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe identifier")),
    request_body = RecipeRequest,
    tag = "Recipes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipe updated", body = Recipe),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn update_recipe(
    Auth(user): Auth,
    Path(recipe_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = send(
        UpdateRecipeCommand {
            id: recipe_id,
            actor: user.clone(),
            recipe: request,
        },
        &state.storage,
    )?;

    audit_log!(&state.storage, AuditEventType::RecipeUpdated, user, "recipe", &recipe.id);
    Ok(Json(recipe))
}

#[utoipa::path(
    delete,
    path = "/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe identifier")),
    tag = "Recipes",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn delete_recipe(
    Auth(user): Auth,
    Path(recipe_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    send(
        DeleteRecipeCommand {
            id: recipe_id.clone(),
            actor: user.clone(),
        },
        &state.storage,
    )?;

    tracing::info!(recipe_id = %recipe_id, user_id = %user.user_id, "Recipe deleted");
    audit_log!(&state.storage, AuditEventType::RecipeDeleted, user, "recipe", &recipe_id);
    Ok(StatusCode::NO_CONTENT)
}
