// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Authentication required")]
    MissingToken,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,
}

/// A single field-level validation problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error")]
    Validation(Vec<FieldIssue>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(AuthFailure),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    /// Controller-level failure with a stable summary and the underlying cause.
    #[error("{error}: {message}")]
    Operation {
        error: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap any error as a controller-level failure.
    pub fn operation(error: &'static str, cause: impl std::fmt::Display) -> Self {
        AppError::Operation {
            error,
            message: cause.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail
            | StoreError::DuplicateUsername
            | StoreError::CityAlreadyTracked => AppError::Conflict(err.to_string()),
            StoreError::UserNotFound => AppError::NotFound(err.to_string()),
            StoreError::Hash(e) => AppError::Internal(anyhow::anyhow!("password hashing: {}", e)),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut issues: Vec<FieldIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    FieldIssue::new(field.to_string(), message)
                })
            })
            .collect();
        issues.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(issues)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let internal = "Internal server error".to_string();

        let (status, error, details, message) = match self {
            AppError::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(issues),
                None,
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None, None),
            AppError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, reason.to_string(), None, None)
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
                None,
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None, None),
            // A missing user behind a verified session means the data is inconsistent.
            AppError::NotFound(msg) => {
                tracing::error!(error = %msg, "Referenced resource not found");
                (StatusCode::INTERNAL_SERVER_ERROR, internal, None, None)
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream service error".to_string(),
                    None,
                    Some(msg),
                )
            }
            AppError::Operation { error, message } => {
                tracing::error!(error, cause = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error.to_string(),
                    None,
                    Some(message),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, internal, None, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, internal, None, None)
            }
        };

        let body = ErrorResponse {
            error,
            details,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
