//! Socket gateway (`GET /socket`)
//!
//! Authenticates before the upgrade, then runs one reader loop and one writer
//! task per connection. The writer drains the connection's outbound queue, so
//! frames leave in the order they were emitted.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::session::SocketSession;
use crate::backend::auth::display_name;
use crate::backend::error::BackendError;
use crate::backend::middleware::{authenticate, token_from_headers, AuthenticatedUser};
use crate::backend::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// Token from `?token=`, then `Authorization: Bearer`, then the `token` cookie
fn handshake_token(query: SocketQuery, headers: &HeaderMap) -> Option<String> {
    query
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| token_from_headers(headers))
}

pub async fn socket_handler(
    State(state): State<AppState>,
    Query(query): Query<SocketQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, BackendError> {
    let token = handshake_token(query, &headers).ok_or_else(|| {
        tracing::warn!("[Realtime] Handshake without a token");
        BackendError::unauthorized("Authentication error")
    })?;
    let user = authenticate(&state.keys, &token)?;
    let name = display_name(state.users.as_ref(), &user).await;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, state, user, name)))
}

async fn run_connection(socket: WebSocket, state: AppState, user: AuthenticatedUser, name: String) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut queue) = mpsc::unbounded_channel();
    let conn = state.hub.rooms().register(user.user_id, outbound);
    tracing::info!(
        "[Realtime] {} connected as {} (connection {}, {} open)",
        name,
        user.user_id,
        conn,
        state.hub.rooms().connection_count()
    );

    let writer = tokio::spawn(async move {
        while let Some(text) = queue.recv().await {
            if sink.send(Message::Text(text.as_ref().into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let session = SocketSession::new(conn, user, name, state.hub.clone(), state.messaging.clone());
    while let Some(received) = stream.next().await {
        match received {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Realtime] Connection {} read error: {}", conn, e);
                break;
            }
        }
    }

    // Unregistering drops the last sender, which ends the writer
    session.disconnect();
    let _ = writer.await;
    tracing::info!(
        "[Realtime] Connection {} closed ({} open)",
        conn,
        state.hub.rooms().connection_count()
    );
}
