//! Notification API integration tests

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_requires_token() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/api/v1/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_api_error!(body, "Access token required");
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "status": "ok" }));

    let (status, body) = app.request(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_api_error!(body, "Route not found");
}

#[tokio::test]
async fn test_list_read_and_delete() {
    let app = TestApp::new();
    let user = app.user("Asha");
    for i in 0..3 {
        app.state
            .notifications
            .create_system_notification(user.id, &format!("Notice {}", i), "Body", None, None)
            .await
            .unwrap();
    }

    let (status, body) = app.get("/api/v1/notifications?page=1&limit=2", &user).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(data["unreadCount"], 3);
    assert_eq!(data["pagination"]["totalNotifications"], 3);
    assert_eq!(data["pagination"]["totalPages"], 2);
    assert_eq!(data["pagination"]["hasNext"], true);

    let id = data["notifications"][0]["id"].as_str().unwrap().to_string();
    let (status, body) = app.put(&format!("/api/v1/notifications/{}/read", id), &user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification marked as read");

    let (_, body) = app.get("/api/v1/notifications?unreadOnly=true", &user).await;
    assert_eq!(body["data"]["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["unreadCount"], 2);

    let (status, body) = app.put("/api/v1/notifications/read-all", &user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modifiedCount"], 2);

    let (status, _) = app.delete(&format!("/api/v1/notifications/{}", id), &user).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.delete(&format!("/api/v1/notifications/{}", id), &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_api_error!(body, "Notification not found");

    let (_, body) = app.delete("/api/v1/notifications", &user).await;
    assert_eq!(body["data"]["deletedCount"], 2);
}

#[tokio::test]
async fn test_other_users_notification_is_not_found() {
    let app = TestApp::new();
    let (owner, other) = (app.user("Owner"), app.user("Other"));
    let notification = app
        .state
        .notifications
        .create_system_notification(owner.id, "Private", "Body", None, None)
        .await
        .unwrap();

    let (status, _) = app
        .put(&format!("/api/v1/notifications/{}/read", notification.id), &other, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_paging_is_rejected() {
    let app = TestApp::new();
    let user = app.user("Asha");

    for query in ["page=0", "limit=101", "limit=abc"] {
        let (status, body) = app.get(&format!("/api/v1/notifications?{}", query), &user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {}", query);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_stats_and_settings() {
    let app = TestApp::new();
    let user = app.user("Asha");
    app.state
        .notifications
        .create_system_notification(user.id, "One", "Body", None, None)
        .await
        .unwrap();

    let (status, body) = app.get("/api/v1/notifications/stats", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["unread"], 1);

    let (_, body) = app.get("/api/v1/notifications/settings", &user).await;
    assert_eq!(body["data"]["emailNotifications"], true);
    assert_eq!(body["data"]["blogNotifications"], false);

    let (status, body) = app
        .put(
            "/api/v1/notifications/settings",
            &user,
            Some(json!({ "jobAlerts": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["jobAlerts"], false);
    assert_eq!(body["data"]["pushNotifications"], true);
}
