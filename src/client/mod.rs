//! Native client
//!
//! Connects to a running server: a socket service with automatic reconnect
//! and event listeners, plus a small REST client for notifications. The
//! session token is read from a JSON file in the user config directory.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod socket;

pub use api::NotificationsApi;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::TokenStore;
pub use socket::{ListenerId, SocketService};
