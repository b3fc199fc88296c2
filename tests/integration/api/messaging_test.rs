//! Messaging API integration tests

use axum::http::StatusCode;
use parttime_comms::backend::realtime::Room;
use parttime_comms::shared::SocketFrame;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_conversation_create_is_idempotent() {
    let app = TestApp::new();
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));

    let (status, first) = app
        .post("/api/v1/messages/conversations", &alice, json!({ "participantIds": [bob.id] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = app
        .post("/api/v1/messages/conversations", &bob, json!({ "participantIds": [alice.id] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(first["data"]["type"], "direct");
}

#[tokio::test]
async fn test_conversation_needs_two_participants() {
    let app = TestApp::new();
    let alice = app.user("Alice");
    let (status, body) = app
        .post("/api/v1/messages/conversations", &alice, json!({ "participantIds": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_send_message_flow() {
    let app = TestApp::new();
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;

    let (tx, mut room_rx) = tokio::sync::mpsc::unbounded_channel();
    let listener = app.state.hub.rooms().register(bob.id, tx);
    app.state.hub.rooms().join(listener, Room::Conversation(conversation));

    let uri = format!("/api/v1/messages/conversations/{}/messages", conversation);
    let (status, body) = app.post(&uri, &alice, json!({ "content": "  Are you free Friday?  " })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Message sent successfully");
    assert_eq!(body["data"]["content"], "Are you free Friday?");
    assert_eq!(body["data"]["readBy"], json!([alice.id]));

    // The room push arrives before the notification push
    let frame = SocketFrame::parse(&room_rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame.event, "new_message");
    assert_eq!(frame.data["conversationId"], conversation.to_string());
    let frame = SocketFrame::parse(&room_rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame.event, "new_notification");
    assert_eq!(frame.data["type"], "message");
    assert_eq!(frame.data["title"], "New message from Alice");

    let (_, body) = app.get("/api/v1/messages/unread-count", &bob).await;
    assert_eq!(body["data"]["unreadCount"], 1);

    let (_, body) = app
        .put(&format!("/api/v1/messages/conversations/{}/read", conversation), &bob, None)
        .await;
    assert_eq!(body["data"]["modifiedCount"], 1);

    let (_, body) = app.get("/api/v1/messages/unread-count", &bob).await;
    assert_eq!(body["data"]["unreadCount"], 0);

    let (_, body) = app.get("/api/v1/messages/conversations", &bob).await;
    assert_eq!(body["data"][0]["messageCount"], 1);
}

#[tokio::test]
async fn test_outsider_cannot_read_or_post() {
    let app = TestApp::new();
    let (alice, bob, eve) = (app.user("Alice"), app.user("Bob"), app.user("Eve"));
    let conversation = app.conversation(&alice, &bob).await;

    let (status, body) = app
        .get(&format!("/api/v1/messages/conversations/{}", conversation), &eve)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_api_error!(body, "Access denied to this conversation");

    let (status, _) = app
        .post(
            &format!("/api/v1/messages/conversations/{}/messages", conversation),
            &eve,
            json!({ "content": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/api/v1/messages/conversations/{}", uuid::Uuid::new_v4()), &eve)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_delete_and_react() {
    let app = TestApp::new();
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;
    let (_, body) = app
        .post(
            &format!("/api/v1/messages/conversations/{}/messages", conversation),
            &alice,
            json!({ "content": "first draft" }),
        )
        .await;
    let message = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put(&format!("/api/v1/messages/{}", message), &bob, Some(json!({ "content": "hijack" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_api_error!(body, "You can only modify your own messages");

    let (status, body) = app
        .put(&format!("/api/v1/messages/{}", message), &alice, Some(json!({ "content": "final" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isEdited"], true);

    let uri = format!("/api/v1/messages/{}/reactions", message);
    let (_, body) = app.post(&uri, &bob, json!({ "reactionType": "like" })).await;
    assert_eq!(body["message"], "Reaction added");
    assert_eq!(body["data"]["reactions"].as_array().unwrap().len(), 1);
    let (_, body) = app.post(&uri, &bob, json!({ "reactionType": "like" })).await;
    assert_eq!(body["message"], "Reaction removed");
    assert!(body["data"]["reactions"].as_array().unwrap().is_empty());

    let (status, _) = app.delete(&format!("/api/v1/messages/{}", message), &alice).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .get(&format!("/api/v1/messages/conversations/{}/messages", conversation), &bob)
        .await;
    assert!(body["data"]["messages"].as_array().unwrap().is_empty());
}
