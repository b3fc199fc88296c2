//! Channel HTTP Handlers
//!
//! Mounted at `/api/v1/channels`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::service::ChannelService;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::handlers::MessagePage;
use crate::backend::middleware::AuthUser;
use crate::backend::routes::params::{parse_id, PageParams};
use crate::shared::messaging::{
    AddMemberRequest, Channel, ChannelType, CreateChannelRequest, Message, SendMessageRequest,
    UpdateChannelRequest, UpdateRoleRequest,
};
use crate::shared::ApiResponse;

const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ChannelFilter {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `GET /?type`
pub async fn list_channels(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Query(filter): Query<ChannelFilter>,
) -> BackendResult<Json<ApiResponse<Vec<Channel>>>> {
    let kind = match filter.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(raw) => Some(
            ChannelType::from_str(raw)
                .ok_or_else(|| BackendError::validation("type", "Invalid channel type"))?,
        ),
        None => None,
    };
    let channels = service.list(user.user_id, kind).await?;
    Ok(Json(ApiResponse::ok(channels)))
}

/// `POST /`
pub async fn create_channel(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateChannelRequest>,
) -> BackendResult<(StatusCode, Json<ApiResponse<Channel>>)> {
    let channel = service.create(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("Channel created successfully", channel)),
    ))
}

/// `GET /{id}`
pub async fn get_channel(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    Ok(Json(ApiResponse::ok(service.get(user.user_id, id).await?)))
}

/// `PUT /{id}`
pub async fn update_channel(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateChannelRequest>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    let channel = service.update(user.user_id, id, request).await?;
    Ok(Json(ApiResponse::ok_with_message("Channel updated successfully", channel)))
}

/// `POST /{id}/members`
pub async fn add_member(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AddMemberRequest>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    let channel = service.add_member(user.user_id, id, request).await?;
    Ok(Json(ApiResponse::ok_with_message("Member added successfully", channel)))
}

/// `DELETE /{id}/members/{user_id}`
pub async fn remove_member(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path((id, target)): Path<(String, String)>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    let target = parse_id(&target, "userId")?;
    let channel = service.remove_member(user.user_id, id, target).await?;
    Ok(Json(ApiResponse::ok_with_message("Member removed successfully", channel)))
}

/// `PUT /{id}/members/{user_id}/role`
pub async fn update_member_role(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path((id, target)): Path<(String, String)>,
    Json(request): Json<UpdateRoleRequest>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    let target = parse_id(&target, "userId")?;
    let channel = service.update_role(user.user_id, id, target, request.role).await?;
    Ok(Json(ApiResponse::ok_with_message("Member role updated successfully", channel)))
}

/// `POST /{id}/archive`
pub async fn archive_channel(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<Channel>>> {
    let id = parse_id(&id, "channelId")?;
    let channel = service.archive(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok_with_message("Channel archived successfully", channel)))
}

/// `GET /{id}/messages`
pub async fn channel_messages(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> BackendResult<Json<ApiResponse<MessagePage>>> {
    let id = parse_id(&id, "channelId")?;
    let (page, limit) = params.parse(DEFAULT_LIMIT)?;
    let (messages, pagination) = service.messages(user.user_id, id, page, limit).await?;
    Ok(Json(ApiResponse::ok(MessagePage { messages, pagination })))
}

/// `POST /{id}/messages`
pub async fn post_message(
    State(service): State<ChannelService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let id = parse_id(&id, "channelId")?;
    let message = service.post(user.user_id, id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("Message sent successfully", message)),
    ))
}
