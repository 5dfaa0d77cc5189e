// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::recipes::validation::{FieldError, ValidationErrors};
use crate::recipes::RecipeError;
use crate::storage::{StorageError, UserDbError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 400 carrying one entry per failed field rule.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: errors.into_inner(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => Self::not_found(format!("{what} not found")),
            StorageError::AlreadyExists(what) => Self::conflict(format!("{what} already exists")),
            StorageError::PermissionDenied { resource, .. } => {
                Self::forbidden(format!("Not allowed to modify {resource}"))
            }
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                Self::internal("Storage error")
            }
        }
    }
}

impl From<RecipeError> for ApiError {
    fn from(e: RecipeError) -> Self {
        match e {
            RecipeError::Validation(errors) => Self::validation(errors),
            RecipeError::Storage(e) => e.into(),
        }
    }
}

impl From<UserDbError> for ApiError {
    fn from(e: UserDbError) -> Self {
        match e {
            UserDbError::NotFound(what) => Self::not_found(format!("{what} not found")),
            UserDbError::AlreadyExists(what) => Self::conflict(format!("{what} already exists")),
            other => {
                tracing::error!(error = %other, "User database operation failed");
                Self::internal("User database error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}
