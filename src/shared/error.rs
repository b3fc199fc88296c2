//! Shared Error Types
//!
//! Raised by the wire types themselves: a socket frame that does not parse, or
//! a draft, request or payload that breaks a field rule. The backend maps
//! `ValidationError` to a 400 with a single field error.
//!
//! # Usage
//!
//! ```rust
//! use parttime_comms::shared::error::SharedError;
//!
//! let error = SharedError::validation("title", "Title cannot exceed 100 characters");
//! assert_eq!(error.field(), Some("title"));
//! ```
use thiserror::Error;

/// Shared error types that can occur on server and client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending field, for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::SerializationError { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
