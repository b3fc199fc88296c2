//! Notification HTTP Handlers
//!
//! Mounted at `/api/v1/notifications` behind `auth_middleware`. Every handler
//! is scoped to the authenticated caller.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::service::NotificationService;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::routes::params::{parse_flag, parse_id, parse_page};
use crate::shared::{ApiResponse, NotificationList, NotificationSettings, NotificationStats};

const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub unread_only: Option<String>,
}

/// `GET /` - one page of the caller's notifications
pub async fn list_notifications(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListNotificationsParams>,
) -> BackendResult<Json<ApiResponse<NotificationList>>> {
    let (page, limit) = parse_page(params.page.as_deref(), params.limit.as_deref(), DEFAULT_LIMIT)?;
    let unread_only = parse_flag(params.unread_only.as_deref());

    let page = service
        .get_user_notifications(user.user_id, page, limit, unread_only)
        .await?;

    Ok(Json(ApiResponse::ok(page.into())))
}

/// `GET /stats`
pub async fn notification_stats(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<NotificationStats>>> {
    let stats = service.get_notification_stats(user.user_id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// `PUT /{id}/read` and `POST /{id}/read`
pub async fn mark_notification_read(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "id")?;
    if !service.mark_as_read(id, user.user_id).await? {
        return Err(BackendError::not_found("Notification not found"));
    }
    Ok(Json(ApiResponse::message("Notification marked as read")))
}

/// `PUT /read-all`
pub async fn mark_all_read(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<Value>>> {
    let modified = service.mark_all_as_read(user.user_id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "All notifications marked as read",
        json!({ "modifiedCount": modified }),
    )))
}

/// `DELETE /{id}`
pub async fn delete_notification(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> BackendResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "id")?;
    if !service.delete_notification(id, user.user_id).await? {
        return Err(BackendError::not_found("Notification not found"));
    }
    Ok(Json(ApiResponse::message("Notification deleted successfully")))
}

/// `DELETE /`
pub async fn delete_all_notifications(
    State(service): State<NotificationService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ApiResponse<Value>>> {
    let deleted = service.delete_all_notifications(user.user_id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "All notifications deleted",
        json!({ "deletedCount": deleted }),
    )))
}

/// `GET /settings`
///
/// Preferences are not stored yet; every user sees the defaults.
pub async fn get_settings(AuthUser(_user): AuthUser) -> Json<ApiResponse<NotificationSettings>> {
    Json(ApiResponse::ok(NotificationSettings::default()))
}

/// `PUT /settings` - validated and echoed back
pub async fn update_settings(
    AuthUser(user): AuthUser,
    Json(settings): Json<NotificationSettings>,
) -> Json<ApiResponse<NotificationSettings>> {
    tracing::debug!("[Notifications] Settings update from {} (not persisted)", user.user_id);
    Json(ApiResponse::ok_with_message("Notification settings updated", settings))
}
