// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passwordless identity endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    auth::AuthError,
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository},
};

/// Body of `/authenticate` and `/logout`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DidTokenRequest {
    /// DID token issued by Magic to the web client.
    pub did_token: String,
}

/// Exchange a Magic DID token for a bearer JWT.
///
/// The response body is the JWT itself as plain text.
#[utoipa::path(
    post,
    path = "/authenticate",
    tag = "Identity",
    request_body = DidTokenRequest,
    responses(
        (status = 200, description = "Signed JWT", body = String, content_type = "text/plain"),
        (status = 401, description = "Invalid didToken or inactive user"),
        (status = 429, description = "Too many requests"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<DidTokenRequest>,
) -> Result<String, AuthError> {
    let audit = AuditRepository::new(&state.storage);

    match state.auth.login(&request.did_token).await {
        Ok(success) => {
            audit.record(
                AuditEvent::new(AuditEventType::AuthSuccess)
                    .with_user(&success.user.id)
                    .with_resource("user", &success.user.id),
            );
            Ok(success.token)
        }
        Err(err) => {
            audit.record(
                AuditEvent::new(AuditEventType::AuthFailure)
                    .with_details(json!({ "reason": err.to_string() }))
                    .failed(err.error_code()),
            );
            Err(err)
        }
    }
}

/// Revoke every Magic session of the DID token's issuer.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Identity",
    request_body = DidTokenRequest,
    responses(
        (status = 204, description = "Sessions revoked"),
        (status = 400, description = "didToken could not be decoded"),
        (status = 429, description = "Too many requests"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<DidTokenRequest>,
) -> Result<StatusCode, AuthError> {
    let result = state.auth.logout(&request.did_token).await;

    let mut event = AuditEvent::new(AuditEventType::Logout);
    if let Err(err) = &result {
        event = event.failed(err.to_string());
    }
    AuditRepository::new(&state.storage).record(event);

    result.map(|()| StatusCode::NO_CONTENT)
}
