/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used by services and HTTP handlers and can be converted
 * to HTTP responses.
 *
 * # Error Categories
 *
 * ## Client Errors
 *
 * - `ValidationError` - One or more request fields are malformed (400)
 * - `Unauthorized` - Missing, expired or invalid token (401)
 * - `Forbidden` - Authenticated, but not allowed to touch the resource (403)
 * - `NotFound` - The resource does not exist for this caller (404)
 * - `HandlerError` - Any other status chosen by a handler
 *
 * ## Server Errors
 *
 * - `StoreError` - Persistence failure (500)
 * - `SerializationError` - JSON failure (500)
 *
 * Server errors are rendered with a generic message. The underlying detail is
 * only attached when the server runs in development mode.
 */

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::shared::SharedError;

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Persistence failures raised by the store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("in-memory store lock poisoned")]
    Poisoned,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),
}

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use parttime_comms::backend::error::BackendError;
///
/// let err = BackendError::not_found("Notification not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request validation failed on one or more fields
    #[error("Validation failed")]
    ValidationError {
        errors: Vec<FieldError>,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
    },

    /// Handler error with an explicit status
    #[error("Handler error: {message}")]
    HandlerError {
        status: StatusCode,
        message: String,
    },

    #[error(transparent)]
    StoreError(#[from] StoreError),

    /// Shared error (validation or serialization)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::HandlerError { status, .. } => *status,
            Self::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    pub fn message(&self) -> String {
        match self {
            Self::ValidationError { .. } => "Validation failed".to_string(),
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::HandlerError { message, .. } => message.clone(),
            Self::SharedError(SharedError::ValidationError { message, .. }) => message.clone(),
            Self::StoreError(_) | Self::SharedError(_) | Self::SerializationError(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Field-level errors, if any
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::ValidationError { errors } => errors.clone(),
            Self::SharedError(SharedError::ValidationError { field, message }) => {
                vec![FieldError::new(field.clone(), message.clone())]
            }
            _ => Vec::new(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::CONFLICT, "Already exists");
        match error {
            BackendError::HandlerError { status, message } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "Already exists");
            }
            _ => panic!("Expected HandlerError"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(BackendError::validation("page", "bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BackendError::unauthorized("no token").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BackendError::forbidden("nope").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(BackendError::not_found("gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BackendError::from(StoreError::Poisoned).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_shared_validation_error() {
        let backend_error: BackendError = SharedError::validation("title", "Title is required").into();
        assert_eq!(backend_error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(backend_error.message(), "Title is required");
        assert_eq!(
            backend_error.field_errors(),
            vec![FieldError::new("title", "Title is required")]
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = BackendError::from(StoreError::Corrupt("bad priority".to_string()));
        assert!(error.is_internal());
        assert_eq!(error.message(), "Internal server error");
        assert!(error.to_string().contains("bad priority"));
    }
}
