//! Channels Module
//!
//! Named rooms with admin/moderator/member roles.
//!
//! # Module Structure
//!
//! ```text
//! channels/
//! ├── mod.rs        - Module exports and routes
//! ├── store.rs      - ChannelStore trait and in-memory store
//! ├── db.rs         - Postgres store
//! ├── service.rs    - ChannelService
//! └── handlers.rs   - REST handlers
//! ```

pub mod db;
pub mod handlers;
pub mod service;
pub mod store;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::server::state::AppState;

pub use db::PgChannelStore;
pub use service::ChannelService;
pub use store::{ChannelStore, MemoryChannelStore};

/// Routes mounted at `/api/v1/channels`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_channels).post(handlers::create_channel))
        .route("/{id}", get(handlers::get_channel).put(handlers::update_channel))
        .route("/{id}/members", post(handlers::add_member))
        .route("/{id}/members/{user_id}", delete(handlers::remove_member))
        .route("/{id}/members/{user_id}/role", put(handlers::update_member_role))
        .route("/{id}/archive", post(handlers::archive_channel))
        .route(
            "/{id}/messages",
            get(handlers::channel_messages).post(handlers::post_message),
        )
}
