//! Call HTTP Handlers
//!
//! Mounted at `/api/v1/calls`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::service::CallService;
use super::store::HistoryFilter;
use crate::backend::auth::display_name;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::routes::params::parse_page;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{CallRecord, CallStatus, CallType, CreateMeetingRequest};
use crate::shared::{ApiResponse, Pagination};

const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "callType")]
    pub call_type: Option<String>,
    pub status: Option<String>,
}

impl HistoryParams {
    fn filter(&self) -> Result<HistoryFilter, BackendError> {
        let call_type = match non_empty(&self.call_type) {
            Some(raw) => Some(CallType::from_str(raw).ok_or_else(|| BackendError::validation("callType", "Invalid call type"))?),
            None => None,
        };
        let status = match non_empty(&self.status) {
            Some(raw) => Some(
                CallStatus::from_str(raw).ok_or_else(|| BackendError::validation("status", "Invalid call status"))?,
            ),
            None => None,
        };
        Ok(HistoryFilter { call_type, status })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct CallHistory {
    pub calls: Vec<CallRecord>,
    pub pagination: Pagination,
}

/// `GET /history?callType&status&page&limit`
pub async fn call_history(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
    Query(params): Query<HistoryParams>,
) -> BackendResult<Json<ApiResponse<CallHistory>>> {
    let (page, limit) = parse_page(params.page.as_deref(), params.limit.as_deref(), DEFAULT_LIMIT)?;
    let filter = params.filter()?;
    let (calls, pagination) = service.history(user.user_id, filter, page, limit).await?;
    Ok(Json(ApiResponse::ok(CallHistory { calls, pagination })))
}

/// `GET /history/{call_id}`
pub async fn get_call(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
    Path(call_id): Path<String>,
) -> BackendResult<Json<ApiResponse<CallRecord>>> {
    Ok(Json(ApiResponse::ok(service.get(user.user_id, &call_id).await?)))
}

/// `POST /meeting-room`
pub async fn create_meeting_room(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateMeetingRequest>,
) -> BackendResult<(StatusCode, Json<ApiResponse<CallRecord>>)> {
    let call = service.create_meeting(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("Meeting room created", call)),
    ))
}

/// `POST /{call_id}/start`
pub async fn start_call(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(call_id): Path<String>,
) -> BackendResult<Json<ApiResponse<CallRecord>>> {
    let name = display_name(state.users.as_ref(), &user).await;
    let call = state.calls.start(user.user_id, &name, &call_id).await?;
    Ok(Json(ApiResponse::ok_with_message("Call started", call)))
}

/// `POST /{call_id}/end`
pub async fn end_call(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(call_id): Path<String>,
) -> BackendResult<Json<ApiResponse<CallRecord>>> {
    let name = display_name(state.users.as_ref(), &user).await;
    let call = state.calls.end(user.user_id, &name, &call_id).await?;
    Ok(Json(ApiResponse::ok_with_message("Call ended", call)))
}

/// `POST /{call_id}/join`
pub async fn join_call(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
    Path(call_id): Path<String>,
) -> BackendResult<Json<ApiResponse<CallRecord>>> {
    let call = service.join(user.user_id, &call_id).await?;
    Ok(Json(ApiResponse::ok_with_message("Joined call", call)))
}

/// `POST /{call_id}/leave`
pub async fn leave_call(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
    Path(call_id): Path<String>,
) -> BackendResult<Json<ApiResponse<CallRecord>>> {
    let call = service.leave(user.user_id, &call_id).await?;
    Ok(Json(ApiResponse::ok_with_message("Left call", call)))
}

/// `GET /active`
pub async fn active_calls(
    State(service): State<CallService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<Vec<CallRecord>>>> {
    Ok(Json(ApiResponse::ok(service.active(user.user_id).await?)))
}
