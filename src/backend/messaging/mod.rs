//! Messaging Module
//!
//! Conversations between users and the messages inside conversations and
//! channels.
//!
//! # Module Structure
//!
//! ```text
//! messaging/
//! ├── mod.rs        - Module exports and routes
//! ├── store.rs      - ConversationStore trait and in-memory store
//! ├── db.rs         - Postgres store
//! ├── service.rs    - MessagingService
//! └── handlers.rs   - REST handlers
//! ```

pub mod db;
pub mod handlers;
pub mod service;
pub mod store;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::backend::server::state::AppState;

pub use db::PgConversationStore;
pub use service::MessagingService;
pub use store::{ConversationStore, MemoryConversationStore};

/// Routes mounted at `/api/v1/messages`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation_messages).post(handlers::send_message),
        )
        .route("/conversations/{id}/read", put(handlers::mark_conversation_read))
        .route("/unread-count", get(handlers::unread_count))
        .route(
            "/{message_id}",
            put(handlers::edit_message).delete(handlers::delete_message),
        )
        .route("/{message_id}/reactions", post(handlers::toggle_reaction))
}
