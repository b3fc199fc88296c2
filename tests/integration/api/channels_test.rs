//! Channel API integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{TestApp, TestUser};

async fn create_channel(app: &TestApp, admin: &TestUser, body: Value) -> String {
    let (status, body) = app.post("/api/v1/channels", admin, body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_and_membership() {
    let app = TestApp::new();
    let (admin, member) = (app.user("Admin"), app.user("Member"));
    let channel = create_channel(&app, &admin, json!({ "name": "warehouse-shifts" })).await;

    let (status, body) = app.post("/api/v1/channels", &member, json!({ "name": "warehouse-shifts" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_api_error!(body, "Channel name already exists");

    let (status, _) = app.get(&format!("/api/v1/channels/{}", channel), &member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let members_uri = format!("/api/v1/channels/{}/members", channel);
    let (status, body) = app.post(&members_uri, &admin, json!({ "userId": member.id })).await;
    assert_eq!(status, StatusCode::OK);
    let added = &body["data"]["members"][1];
    assert_eq!(added["role"], "member");
    assert_eq!(added["permissions"]["canPost"], true);
    assert_eq!(added["permissions"]["canInvite"], false);

    let (status, _) = app.post(&members_uri, &admin, json!({ "userId": member.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/v1/channels", &member).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .put(
            &format!("/api/v1/channels/{}/members/{}/role", channel, member.id),
            &admin,
            Some(json!({ "role": "moderator" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"][1]["permissions"]["canPin"], true);

    let (status, _) = app
        .delete(&format!("/api/v1/channels/{}/members/{}", channel, member.id), &member)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/v1/channels", &member).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_announcement_channel_accepts_admin_posts_only() {
    let app = TestApp::new();
    let (admin, member) = (app.user("Admin"), app.user("Member"));
    let channel = create_channel(&app, &admin, json!({ "name": "notices", "type": "announcement" })).await;
    app.post(
        &format!("/api/v1/channels/{}/members", channel),
        &admin,
        json!({ "userId": member.id }),
    )
    .await;

    let uri = format!("/api/v1/channels/{}/messages", channel);
    let (status, _) = app.post(&uri, &member, json!({ "content": "can I post?" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&uri, &admin, json!({ "content": "Site closed Monday" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["channelId"], channel.as_str());

    let (_, body) = app.get(&uri, &member).await;
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_only_actions() {
    let app = TestApp::new();
    let (admin, member) = (app.user("Admin"), app.user("Member"));
    let channel = create_channel(&app, &admin, json!({ "name": "kitchen" })).await;
    app.post(
        &format!("/api/v1/channels/{}/members", channel),
        &admin,
        json!({ "userId": member.id }),
    )
    .await;

    let (status, body) = app
        .put(&format!("/api/v1/channels/{}", channel), &member, Some(json!({ "topic": "lunch" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_api_error!(body, "Only channel admins can perform this action");

    let (status, _) = app.post(&format!("/api/v1/channels/{}/archive", channel), &member, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&format!("/api/v1/channels/{}/archive", channel), &admin, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isArchived"], true);

    let (_, body) = app.get("/api/v1/channels", &admin).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
