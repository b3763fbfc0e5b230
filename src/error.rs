//! Error types for Libris server

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::flash::PageError;

/// Error codes reported in JSON error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BookNotAvailable = 5,
    Duplicate = 6,
    AlreadyReturned = 7,
    BadValue = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller is not logged in, or presented bad credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Caller is logged in but lacks the staff flag
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller does not own the record it tries to act on
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate borrow: {0}")]
    DuplicateBorrow(String),

    #[error("Already returned: {0}")]
    AlreadyReturned(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Unauthorized(_) | AppError::Forbidden(_) => {
                ErrorCode::NotAuthorized
            }
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Unavailable(_) => ErrorCode::BookNotAvailable,
            AppError::DuplicateBorrow(_) | AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::AlreadyReturned(_) => ErrorCode::AlreadyReturned,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_)
            | AppError::DuplicateBorrow(_)
            | AppError::AlreadyReturned(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user, `None` for server-side failures
    pub fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Authentication(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Unavailable(msg)
            | AppError::DuplicateBorrow(msg)
            | AppError::AlreadyReturned(msg)
            | AppError::Conflict(msg) => Some(msg),
            AppError::Database(_) | AppError::Internal(_) => None,
        }
    }

    /// Page a handler falls back to when it did not pick one
    pub fn default_redirect(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "/login/",
            _ => "/",
        }
    }

    /// Attach the page the user is sent back to
    pub fn redirect_to(self, path: impl Into<String>) -> PageError {
        PageError::new(self, path)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value ({})", field, err.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    /// Body for failures that are not shown to the user as a flash message
    pub fn from_error(error: &AppError) -> Self {
        let code = error.code();
        let message = match error {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let fallback = self.default_redirect();
        PageError::new(self, fallback).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
