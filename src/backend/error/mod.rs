//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! These errors are used in services and HTTP handlers and can be converted to
//! HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and the JSON error envelope
//! ```
//!
//! # Error Types
//!
//! - `BackendError` - Everything a handler can fail with
//! - `StoreError` - Persistence failures from the store implementations
//! - `FieldError` - One field-level validation message

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use conversion::{expose_details, set_expose_details};
pub use types::{BackendError, FieldError, StoreError};

/// Result alias used across the backend services
pub type BackendResult<T> = Result<T, BackendError>;
