//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Every error leaves
//! the API as `{ "error": "<message>" }`, occasionally with `path` or
//! `message` next to it.

use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::repository::RepositoryError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Message shown for every 5xx caused by our own failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";

static EXPOSE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Decide once, at startup, whether 500 responses carry the underlying error
/// text. Later calls are ignored.
pub fn expose_internal_details(enabled: bool) {
    let _ = EXPOSE_DETAILS.set(enabled);
}

fn internal_details_exposed() -> bool {
    EXPOSE_DETAILS.get().copied().unwrap_or(false)
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    #[error("Token requerido")]
    MissingToken,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("Not Found")]
    RouteNotFound { path: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The identity provider refused the operation; its message is kept
    #[error("{0}")]
    Upstream(String),

    // Server errors (5xx)
    #[error("auth error")]
    AuthUnavailable,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Domain(_) | AppError::Upstream(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::AuthUnavailable
            | AppError::Repository(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            path: None,
            message: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::RouteNotFound { path } => ErrorResponse {
                path: Some(path.clone()),
                ..ErrorResponse::new(self.to_string())
            },

            AppError::Repository(e) => {
                tracing::error!("Repository error: {:?}", e);
                internal_body(e.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_body(msg.clone())
            }

            _ => ErrorResponse::new(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

fn internal_body(detail: String) -> ErrorResponse {
    ErrorResponse {
        message: internal_details_exposed().then_some(detail),
        ..ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
