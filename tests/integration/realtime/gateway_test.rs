//! Socket gateway end to end with a raw WebSocket client

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parttime_comms::shared::SocketFrame;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::common::{TestApp, TestUser};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, user: &TestUser) -> Socket {
    let url = format!("ws://{}/socket?token={}", addr, user.token);
    let (socket, _) = connect_async(url.as_str()).await.expect("socket handshake");
    socket
}

async fn send(socket: &mut Socket, event: &str, data: Value) {
    let text = SocketFrame::from_value(event, data).to_text().unwrap();
    socket.send(Message::Text(text.into())).await.unwrap();
}

/// Read frames until `event` arrives
async fn expect_event(socket: &mut Socket, event: &str) -> Value {
    let wait = async {
        while let Some(message) = socket.next().await {
            if let Message::Text(text) = message.expect("socket error") {
                let frame = SocketFrame::parse(text.as_str()).unwrap();
                if frame.event == event {
                    return frame.data;
                }
            }
        }
        panic!("socket closed before {}", event);
    };
    tokio::time::timeout(Duration::from_secs(3), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", event))
}

/// Let the server process frames already sent
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_handshake_requires_valid_token() {
    let app = TestApp::new();
    let addr = app.serve().await;

    for url in [
        format!("ws://{}/socket", addr),
        format!("ws://{}/socket?token=not-a-jwt", addr),
    ] {
        match connect_async(url.as_str()).await {
            Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
            other => panic!("expected 401, got {:?}", other.map(|_| ())),
        }
    }
}

#[tokio::test]
async fn test_message_relay_and_typing() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;

    let mut alice_ws = connect(addr, &alice).await;
    let mut bob_ws = connect(addr, &bob).await;
    send(&mut alice_ws, "join_conversation", json!({ "conversationId": conversation })).await;
    send(&mut bob_ws, "join_conversation", json!({ "conversationId": conversation })).await;
    settle().await;

    send(
        &mut alice_ws,
        "send_message",
        json!({ "conversationId": conversation, "content": "shift swap?" }),
    )
    .await;
    let relayed = expect_event(&mut bob_ws, "new_message").await;
    assert_eq!(relayed["content"], "shift swap?");
    assert_eq!(relayed["sender"], alice.id.to_string());
    assert!(relayed["timestamp"].is_string());

    send(&mut bob_ws, "typing_start", json!({ "conversationId": conversation })).await;
    let typing = expect_event(&mut alice_ws, "user_typing").await;
    assert_eq!(typing["userId"], bob.id.to_string());
    assert_eq!(typing["username"], "Bob");
}

#[tokio::test]
async fn test_rest_writes_reach_sockets() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;

    let mut bob_ws = connect(addr, &bob).await;
    send(&mut bob_ws, "join_conversation", json!({ "conversationId": conversation })).await;
    settle().await;

    app.post(
        &format!("/api/v1/messages/conversations/{}/messages", conversation),
        &alice,
        json!({ "content": "Posted over REST" }),
    )
    .await;

    let message = expect_event(&mut bob_ws, "new_message").await;
    assert_eq!(message["content"], "Posted over REST");
    let notification = expect_event(&mut bob_ws, "new_notification").await;
    assert_eq!(notification["type"], "message");
}

#[tokio::test]
async fn test_call_signalling_and_disconnect() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));

    let mut alice_ws = connect(addr, &alice).await;
    let mut bob_ws = connect(addr, &bob).await;
    settle().await;

    send(&mut alice_ws, "call_initiate", json!({ "targetUserId": bob.id, "callType": "video" })).await;
    let incoming = expect_event(&mut bob_ws, "incoming_call").await;
    assert_eq!(incoming["callerName"], "Alice");
    let call_id = incoming["callId"].as_str().unwrap().to_string();
    assert!(call_id.starts_with("call_"));

    send(&mut bob_ws, "call_answer", json!({ "callId": call_id })).await;
    let answered = expect_event(&mut alice_ws, "call_answered").await;
    assert_eq!(answered["userId"], bob.id.to_string());

    alice_ws.close(None).await.unwrap();
    drop(alice_ws);

    let presence = expect_event(&mut bob_ws, "presence_update").await;
    assert_eq!(presence["userId"], alice.id.to_string());
    assert_eq!(presence["status"], "offline");
    let ended = expect_event(&mut bob_ws, "call_ended").await;
    assert_eq!(ended["callId"], call_id.as_str());
    assert_eq!(ended["reason"], "disconnected");
    assert!(app.state.hub.calls().is_empty());
}

#[tokio::test]
async fn test_job_application_reaches_employer_socket() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (employer, applicant) = (app.user("Erin"), app.user("Sam"));

    let mut employer_ws = connect(addr, &employer).await;
    settle().await;
    assert_eq!(app.state.hub.rooms().connection_count(), 1);

    app.state
        .notifications
        .create_job_application_notification(employer.id, applicant.id, "Sam", "Barista", "job-42", "app-7")
        .await
        .unwrap();

    let pushed = expect_event(&mut employer_ws, "new_notification").await;
    assert_eq!(pushed["type"], "job_application");
    assert_eq!(pushed["title"], "New Job Application");
    assert_eq!(pushed["message"], "Sam applied for \"Barista\"");
    assert_eq!(pushed["data"]["jobId"], "job-42");
    assert_eq!(pushed["data"]["applicationId"], "app-7");
    assert_eq!(pushed["data"]["applicantId"], applicant.id.to_string());

    employer_ws.close(None).await.unwrap();
    drop(employer_ws);
    for _ in 0..30 {
        if app.state.hub.rooms().connection_count() == 0 {
            break;
        }
        settle().await;
    }
    assert_eq!(app.state.hub.rooms().connection_count(), 0);
}
