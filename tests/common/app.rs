//! In-memory test application

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use parttime_comms::backend::routes::create_router;
use parttime_comms::backend::server::AppState;
use parttime_comms::backend::ServerConfig;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// A signed-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub token: String,
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::in_memory(ServerConfig::default());
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub fn user(&self, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        let token = self
            .state
            .keys
            .create_token(id, format!("{}@example.com", name.to_lowercase()), Some(name.to_string()))
            .expect("Failed to create test token");
        TestUser {
            id,
            name: name.to_string(),
            token,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Body is not JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(user), body).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(user), None).await
    }

    /// Create a direct conversation between two users and return its id
    pub async fn conversation(&self, a: &TestUser, b: &TestUser) -> Uuid {
        let (status, body) = self
            .post(
                "/api/v1/messages/conversations",
                a,
                serde_json::json!({ "participantIds": [b.id] }),
            )
            .await;
        assert!(status.is_success(), "conversation create failed: {}", body);
        body["data"]["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("conversation id")
    }

    /// Serve the router on a random local port
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server failed");
        });
        addr
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
