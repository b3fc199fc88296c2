//! Client socket wrapper and REST client against a live server

use std::time::Duration;

use parttime_comms::client::{ClientConfig, NotificationsApi, SocketService, TokenStore};
use parttime_comms::shared::messaging::MessageType;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::common::{TestApp, TestUser};

struct Client {
    socket: SocketService,
    api: NotificationsApi,
    _dir: TempDir,
}

fn client(addr: std::net::SocketAddr, user: Option<&TestUser>) -> Client {
    let dir = tempfile::tempdir().unwrap();
    let tokens = TokenStore::at(dir.path().join("session.json"));
    if let Some(user) = user {
        tokens.save(&user.token).unwrap();
    }
    let config = ClientConfig::new(format!("http://{}", addr)).unwrap();
    Client {
        socket: SocketService::new(config.clone(), tokens.clone()),
        api: NotificationsApi::new(config, tokens),
        _dir: dir,
    }
}

fn forward(socket: &SocketService, event: &str) -> mpsc::UnboundedReceiver<Value> {
    let (tx, rx) = mpsc::unbounded_channel();
    socket.on(event, move |data| {
        let _ = tx.send(data.clone());
    });
    rx
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("listener dropped")
}

#[tokio::test]
async fn test_connect_emit_and_receive() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let (alice, bob) = (app.user("Alice"), app.user("Bob"));
    let conversation = app.conversation(&alice, &bob).await;

    let alice_client = client(addr, Some(&alice));
    let bob_client = client(addr, Some(&bob));
    let mut presence = forward(&bob_client.socket, "presence_update");
    let mut messages = forward(&bob_client.socket, "new_message");

    bob_client.socket.connect().await.unwrap();
    assert!(bob_client.socket.is_connected());
    // Bob hears his own online presence first
    assert_eq!(recv(&mut presence).await["userId"], bob.id.to_string());

    alice_client.socket.connect().await.unwrap();
    let online = recv(&mut presence).await;
    assert_eq!(online["userId"], alice.id.to_string());
    assert_eq!(online["status"], "online");

    assert!(alice_client.socket.join_conversation(conversation));
    assert!(bob_client.socket.join_conversation(conversation));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(alice_client.socket.send_message(conversation, "on my way", MessageType::Text));
    let message = recv(&mut messages).await;
    assert_eq!(message["content"], "on my way");
    assert_eq!(message["senderName"], "Alice");

    alice_client.socket.disconnect().await;
    assert!(!alice_client.socket.is_connected());
    assert!(!alice_client.socket.update_presence("away"));
    assert_eq!(alice_client.socket.listener_count("presence_update"), 0);

    let offline = recv(&mut presence).await;
    assert_eq!(offline["status"], "offline");
    bob_client.socket.disconnect().await;
}

#[tokio::test]
async fn test_rejected_token_leaves_client_disconnected() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let stranger = TestUser {
        id: uuid::Uuid::new_v4(),
        name: "Stranger".to_string(),
        token: "forged".to_string(),
    };

    let c = client(addr, Some(&stranger));
    c.socket.connect().await.unwrap();
    assert!(!c.socket.is_connected());
    c.socket.disconnect().await;
}

#[tokio::test]
async fn test_notifications_api_refetch() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let user = app.user("Asha");
    for title in ["Shift confirmed", "Payment sent"] {
        app.state
            .notifications
            .create_system_notification(user.id, title, "Details inside", None, None)
            .await
            .unwrap();
    }

    let c = client(addr, Some(&user));
    let list = c.api.list(1, 20, false).await.unwrap();
    assert_eq!(list.notifications.len(), 2);
    assert_eq!(list.unread_count, 2);
    assert_eq!(c.api.unread_count().await.unwrap(), 2);

    c.api.mark_read(list.notifications[0].id).await.unwrap();
    assert_eq!(c.api.mark_all_read().await.unwrap(), 1);
    assert_eq!(c.api.stats().await.unwrap().unread, 0);

    c.api.delete(list.notifications[1].id).await.unwrap();
    match c.api.delete(list.notifications[1].id).await {
        Err(parttime_comms::client::ClientError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Notification not found");
        }
        other => panic!("expected a 404, got {:?}", other),
    }
}
