//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and the native client. These types are used for serialization
//! over the REST API and the socket channel.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code:
//!
//! - **`notification`** - Notification records, drafts, pages and stats
//! - **`event`** - The socket frame and event contract
//! - **`envelope`** - The `{success, message?, data?}` REST envelope
//! - **`messaging`** - Conversations, channels, messages and calls
//! - **`error`** - Errors shared by both sides
//! - **`config`** - Configuration errors and the runtime environment

/// Notification data structures
pub mod notification;

/// Socket event contract
pub mod event;

/// REST response envelope
pub mod envelope;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Conversations, channels, messages and calls
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, Environment};
pub use envelope::{ApiResponse, Pagination};
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent, SocketFrame};
pub use notification::{
    Notification, NotificationDraft, NotificationList, NotificationPage, NotificationSettings, NotificationStats,
    NotificationType, Priority, SenderProfile,
};
