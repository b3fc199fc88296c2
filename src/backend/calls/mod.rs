//! Calls Module
//!
//! Persistent meeting-room call records. Live ringing state for socket calls
//! is kept separately by the realtime hub.
//!
//! # Module Structure
//!
//! ```text
//! calls/
//! ├── mod.rs        - Module exports and routes
//! ├── store.rs      - CallStore trait, history filter and in-memory store
//! ├── db.rs         - Postgres store
//! ├── service.rs    - CallService
//! └── handlers.rs   - REST handlers
//! ```

pub mod db;
pub mod handlers;
pub mod service;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::server::state::AppState;

pub use db::PgCallStore;
pub use service::CallService;
pub use store::{CallStore, HistoryFilter, MemoryCallStore};

/// Routes mounted at `/api/v1/calls`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(handlers::call_history))
        .route("/history/{call_id}", get(handlers::get_call))
        .route("/meeting-room", post(handlers::create_meeting_room))
        .route("/active", get(handlers::active_calls))
        .route("/{call_id}/start", post(handlers::start_call))
        .route("/{call_id}/end", post(handlers::end_call))
        .route("/{call_id}/join", post(handlers::join_call))
        .route("/{call_id}/leave", post(handlers::leave_call))
}
