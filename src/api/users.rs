// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    auth::{AdminOnly, Auth, Role},
    error::ApiError,
    models::User,
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository, UserStore},
};

/// Body of `PUT /v1/users/{user_id}/roles`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRolesRequest {
    /// Replacement role set. Must not be empty.
    pub roles: Vec<Role>,
}

/// Body of `PUT /v1/users/{user_id}/active`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Get the stored record of the authenticated user.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User record", body = User),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Token subject has no user record")
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    load_user(&state, &user.user_id).map(Json)
}

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list()?))
}

/// Replace a user's roles. The change applies to the user's next request.
#[utoipa::path(
    put,
    path = "/v1/users/{user_id}/roles",
    params(("user_id" = String, Path, description = "User identifier")),
    request_body = UpdateRolesRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Empty role set or own admin role removed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_roles(
    AdminOnly(admin): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateRolesRequest>,
) -> Result<Json<User>, ApiError> {
    if request.roles.is_empty() {
        return Err(ApiError::bad_request("At least one role is required"));
    }
    if user_id == admin.user_id && !request.roles.contains(&Role::Admin) {
        return Err(ApiError::bad_request("You cannot remove your own admin role"));
    }

    let mut user = load_user(&state, &user_id)?;
    user.roles = request.roles;
    user.updated_at = chrono::Utc::now();
    state.users.update(&user)?;

    tracing::info!(user_id = %user.id, admin_id = %admin.user_id, roles = ?user.roles, "User roles changed");
    AuditRepository::new(&state.storage).record(
        AuditEvent::new(AuditEventType::UserRolesChanged)
            .with_user(&admin.user_id)
            .with_resource("user", &user.id)
            .with_details(json!({ "roles": user.roles })),
    );
    Ok(Json(user))
}

/// Activate or deactivate a user. Inactive users cannot log in, and
/// bearer tokens they already hold stop working.
#[utoipa::path(
    put,
    path = "/v1/users/{user_id}/active",
    params(("user_id" = String, Path, description = "User identifier")),
    request_body = UpdateActiveRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Admins cannot deactivate themselves"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_active(
    AdminOnly(admin): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateActiveRequest>,
) -> Result<Json<User>, ApiError> {
    if !request.is_active && user_id == admin.user_id {
        return Err(ApiError::bad_request("You cannot deactivate yourself"));
    }

    let mut user = load_user(&state, &user_id)?;
    user.is_active = request.is_active;
    user.updated_at = chrono::Utc::now();
    state.users.update(&user)?;

    tracing::info!(user_id = %user.id, admin_id = %admin.user_id, is_active = user.is_active, "User activation changed");
    AuditRepository::new(&state.storage).record(
        AuditEvent::new(AuditEventType::UserActivationChanged)
            .with_user(&admin.user_id)
            .with_resource("user", &user.id)
            .with_details(json!({ "isActive": user.is_active })),
    );
    Ok(Json(user))
}
