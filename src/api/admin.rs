// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only audit trail queries.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository},
};

/// Widest date range a single query may scan.
pub const MAX_RANGE_DAYS: i64 = 31;
const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Query parameters for audit log queries.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Start date (YYYY-MM-DD format), defaults to today.
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD format), defaults to today.
    pub end_date: Option<String>,
    /// Filter by acting user ID.
    pub user_id: Option<String>,
    /// Filter by event type, e.g. `recipe_created`.
    pub event_type: Option<AuditEventType>,
    /// Maximum number of results (default 100, max 1000).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

fn parse_date(value: Option<&str>, name: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    match value {
        None => Ok(today),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::bad_request(format!("Invalid {name} format. Use YYYY-MM-DD."))
        }),
    }
}

/// Query audit logs.
///
/// Filters by date range, acting user and event type.
#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn query_audit_logs(
    AdminOnly(_admin): AdminOnly,
    Query(params): Query<AuditQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let start = parse_date(params.start_date.as_deref(), "start_date", today)?;
    let end = parse_date(params.end_date.as_deref(), "end_date", today)?;

    if end < start {
        return Err(ApiError::bad_request("end_date must not be before start_date"));
    }
    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(ApiError::bad_request(format!(
            "Date range cannot exceed {MAX_RANGE_DAYS} days"
        )));
    }

    let mut events = AuditRepository::new(&state.storage).read_events_range(
        &start.format("%Y-%m-%d").to_string(),
        &end.format("%Y-%m-%d").to_string(),
    )?;

    if let Some(user_id) = &params.user_id {
        events.retain(|e| e.user_id.as_deref() == Some(user_id.as_str()));
    }
    if let Some(event_type) = params.event_type {
        events.retain(|e| e.event_type == event_type);
    }

    let total = events.len();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let has_more = offset.saturating_add(limit) < total;
    let events = events.into_iter().skip(offset).take(limit).collect();

    Ok(Json(AuditLogResponse {
        events,
        total,
        has_more,
    }))
}
