//! Backend Module
//!
//! The axum server: notification REST and push, the socket gateway, and the
//! messaging, channel and call REST surfaces that feed it. Only compiled with
//! the `ssr` feature.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Configuration, AppState, create_app
//! ├── routes/         - Router assembly and shared query parsing
//! ├── error/          - BackendError, StoreError and response rendering
//! ├── auth/           - Token verification and user display lookups
//! ├── middleware/     - auth_middleware and the AuthUser extractor
//! ├── notifications/  - NotificationService, stores and REST
//! ├── realtime/       - Rooms, call signaling and the socket gateway
//! ├── messaging/      - Conversations and messages
//! ├── channels/       - Role-based channels
//! └── calls/          - Meeting-room call records
//! ```
//!
//! # Layering
//!
//! Handlers parse and authorize, services hold the business rules, and stores
//! (one `async_trait` per concern, Postgres or in-memory) persist. Services
//! emit socket frames through the shared `RoomRegistry` after a write
//! succeeds; a frame with no connected recipient is simply not delivered.

pub mod auth;
pub mod calls;
pub mod channels;
pub mod error;
pub mod messaging;
pub mod middleware;
pub mod notifications;
pub mod realtime;
pub mod routes;
pub mod server;

pub use error::{BackendError, BackendResult};
pub use server::{create_app, AppState, ServerConfig};
