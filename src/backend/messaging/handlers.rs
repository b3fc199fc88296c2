//! Messaging HTTP Handlers
//!
//! Mounted at `/api/v1/messages`. Conversation routes act on the caller's
//! conversations; message routes act on single messages by id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::service::MessagingService;
use crate::backend::auth::display_name;
use crate::backend::error::BackendResult;
use crate::backend::middleware::AuthUser;
use crate::backend::routes::params::{parse_id, PageParams};
use crate::backend::server::state::AppState;
use crate::shared::messaging::{
    Conversation, CreateConversationRequest, EditMessageRequest, Message, ReactionRequest,
    SendMessageRequest,
};
use crate::shared::{ApiResponse, Pagination};

const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

/// `GET /conversations`
pub async fn list_conversations(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<Vec<Conversation>>>> {
    let conversations = service.list_conversations(user.user_id).await?;
    Ok(Json(ApiResponse::ok(conversations)))
}

/// `POST /conversations` - 201 when created, 200 when an existing one is returned
pub async fn create_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateConversationRequest>,
) -> BackendResult<(StatusCode, Json<ApiResponse<Conversation>>)> {
    let (conversation, created) = service.create_conversation(user.user_id, request).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ApiResponse::ok(conversation))))
}

/// `GET /conversations/{id}`
pub async fn get_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<Conversation>>> {
    let id = parse_id(&id, "conversationId")?;
    let conversation = service.conversation_for(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// `DELETE /conversations/{id}`
pub async fn delete_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "conversationId")?;
    service.delete_conversation(user.user_id, id).await?;
    Ok(Json(ApiResponse::message("Conversation deleted successfully")))
}

/// `GET /conversations/{id}/messages`
pub async fn conversation_messages(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> BackendResult<Json<ApiResponse<MessagePage>>> {
    let id = parse_id(&id, "conversationId")?;
    let (page, limit) = params.parse(DEFAULT_LIMIT)?;
    let (messages, pagination) = service
        .conversation_messages(user.user_id, id, page, limit)
        .await?;
    Ok(Json(ApiResponse::ok(MessagePage { messages, pagination })))
}

/// `POST /conversations/{id}/messages`
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let id = parse_id(&id, "conversationId")?;
    let sender_name = display_name(state.users.as_ref(), &user).await;
    let message = state
        .messaging
        .send_message(user.user_id, &sender_name, id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("Message sent successfully", message)),
    ))
}

/// `PUT /{messageId}`
pub async fn edit_message(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<String>,
    Json(request): Json<EditMessageRequest>,
) -> BackendResult<Json<ApiResponse<Message>>> {
    let message_id = parse_id(&message_id, "messageId")?;
    let message = service
        .edit_message(user.user_id, message_id, &request.content)
        .await?;
    Ok(Json(ApiResponse::ok_with_message("Message updated successfully", message)))
}

/// `DELETE /{messageId}`
pub async fn delete_message(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<String>,
) -> BackendResult<Json<ApiResponse<()>>> {
    let message_id = parse_id(&message_id, "messageId")?;
    service.delete_message(user.user_id, message_id).await?;
    Ok(Json(ApiResponse::message("Message deleted successfully")))
}

/// `POST /{messageId}/reactions`
pub async fn toggle_reaction(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<String>,
    Json(request): Json<ReactionRequest>,
) -> BackendResult<Json<ApiResponse<Message>>> {
    let message_id = parse_id(&message_id, "messageId")?;
    let (message, added) = service
        .toggle_reaction(user.user_id, message_id, &request.reaction_type)
        .await?;
    let note = if added { "Reaction added" } else { "Reaction removed" };
    Ok(Json(ApiResponse::ok_with_message(note, message)))
}

/// `PUT /conversations/{id}/read`
pub async fn mark_conversation_read(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id, "conversationId")?;
    let count = service.mark_conversation_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Messages marked as read",
        json!({ "modifiedCount": count }),
    )))
}

/// `GET /unread-count`
pub async fn unread_count(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<Value>>> {
    let count = service.unread_count(user.user_id).await?;
    Ok(Json(ApiResponse::ok(json!({ "unreadCount": count }))))
}
