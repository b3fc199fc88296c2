//! Call API integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_meeting_lifecycle_posts_system_messages() {
    let app = TestApp::new();
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;

    let (status, body) = app
        .post(
            "/api/v1/calls/meeting-room",
            &alice,
            json!({ "callType": "voice", "conversationId": conversation, "participants": [bob.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Meeting room created");
    let call = &body["data"];
    assert_eq!(call["status"], "initiated");
    assert!(call["roomName"].as_str().unwrap().starts_with("comms-"));
    assert!(call["jitsiUrl"].as_str().unwrap().starts_with("https://meet.jit.si/comms-"));
    let call_id = call["callId"].as_str().unwrap().to_string();

    let (status, body) = app.post(&format!("/api/v1/calls/{}/start", call_id), &alice, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = app.get("/api/v1/calls/active", &bob).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app.post(&format!("/api/v1/calls/{}/end", call_id), &bob, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ended");
    assert!(body["data"]["durationSecs"].as_i64().is_some());

    let (status, body) = app.post(&format!("/api/v1/calls/{}/join", call_id), &bob, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_api_error!(body, "Call has ended");

    let (_, body) = app
        .get(&format!("/api/v1/messages/conversations/{}/messages", conversation), &bob)
        .await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["messageType"], "call_end");
    assert_eq!(messages[0]["content"], "Bob ended the voice call");
    assert_eq!(messages[1]["messageType"], "call_start");
    assert_eq!(messages[1]["content"], "Alice started a voice call");
}

#[tokio::test]
async fn test_channel_meeting_posts_to_channel() {
    let app = TestApp::new();
    let host = app.user("Hana");
    let (status, body) = app.post("/api/v1/channels", &host, json!({ "name": "night-shift" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let channel = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/v1/calls/meeting-room",
            &host,
            json!({ "callType": "audio", "channelId": channel }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["callType"], "voice");
    let call_id = body["data"]["callId"].as_str().unwrap().to_string();

    app.post(&format!("/api/v1/calls/{}/start", call_id), &host, json!({})).await;
    let (status, _) = app.post(&format!("/api/v1/calls/{}/end", call_id), &host, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/v1/channels/{}/messages", channel), &host).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["messageType"], "call_end");
    assert_eq!(messages[0]["content"], "Hana ended the voice call");
    assert_eq!(messages[1]["content"], "Hana started a voice call");
    assert_eq!(messages[1]["channelId"], channel.as_str());
}

#[tokio::test]
async fn test_history_is_scoped_to_participants() {
    let app = TestApp::new();
    let (alice, eve) = (app.user("Alice"), app.user("Eve"));
    let (_, body) = app.post("/api/v1/calls/meeting-room", &alice, json!({})).await;
    let call_id = body["data"]["callId"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/api/v1/calls/history/{}", call_id), &eve).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_api_error!(body, "Access denied to this call");

    let (_, body) = app.get("/api/v1/calls/history", &alice).await;
    assert_eq!(body["data"]["calls"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);
    let (_, body) = app.get("/api/v1/calls/history", &eve).await;
    assert!(body["data"]["calls"].as_array().unwrap().is_empty());

    let (status, _) = app.get("/api/v1/calls/history?callType=hologram", &alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_and_leave() {
    let app = TestApp::new();
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let (_, body) = app.post("/api/v1/calls/meeting-room", &alice, json!({})).await;
    let call_id = body["data"]["callId"].as_str().unwrap().to_string();

    let (status, body) = app.post(&format!("/api/v1/calls/{}/join", call_id), &bob, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 2);

    let (status, body) = app.post(&format!("/api/v1/calls/{}/leave", call_id), &bob, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["participants"][1]["leftAt"].is_string());

    let (_, body) = app.post(&format!("/api/v1/calls/{}/join", call_id), &bob, json!({})).await;
    assert!(body["data"]["participants"][1]["leftAt"].is_null());

    let (status, _) = app.post("/api/v1/calls/missing/join", &bob, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
