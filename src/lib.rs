//! parttime-comms
//!
//! Notification, messaging and real-time communication service for the
//! part-time jobs platform.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types used by both sides: notifications, the socket
//!   event contract, the REST envelope, conversations, channels and calls
//! - **`backend`** - The axum server (`ssr` feature)
//! - **`client`** - Native socket wrapper and REST re-fetch client (`client`
//!   feature)
//!
//! # Usage
//!
//! ```rust,no_run
//! use parttime_comms::backend::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::load()?).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Native client for the socket gateway and REST API
#[cfg(feature = "client")]
pub mod client;
