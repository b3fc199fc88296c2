//! Notifications Module
//!
//! Persistent per-user notifications with a real-time push to the recipient.
//!
//! # Module Structure
//!
//! ```text
//! notifications/
//! ├── mod.rs        - Module exports and routes
//! ├── store.rs      - NotificationStore trait and in-memory store
//! ├── db.rs         - Postgres store
//! ├── templates.rs  - Typed notification drafts
//! ├── service.rs    - NotificationService
//! └── handlers.rs   - REST handlers
//! ```

pub mod db;
pub mod handlers;
pub mod service;
pub mod store;
pub mod templates;

use axum::{
    routing::{get, put},
    Router,
};

use crate::backend::server::state::AppState;

pub use db::PgNotificationStore;
pub use service::NotificationService;
pub use store::{MemoryNotificationStore, NotificationStore};
pub use templates::{CommunityAction, JobDecision, PaymentDirection, VerificationOutcome};

/// Routes mounted at `/api/v1/notifications`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_notifications).delete(handlers::delete_all_notifications),
        )
        .route("/stats", get(handlers::notification_stats))
        .route("/read-all", put(handlers::mark_all_read))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route(
            "/{id}/read",
            put(handlers::mark_notification_read).post(handlers::mark_notification_read),
        )
        .route("/{id}", axum::routing::delete(handlers::delete_notification))
}
