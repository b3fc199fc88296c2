//! Notifications REST client
//!
//! Thin wrapper over `/api/v1/notifications`. Every call sends the stored
//! session token as a Bearer header and unwraps the `{success, message, data}`
//! envelope.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use super::config::ClientConfig;
use super::error::{ClientError, ClientResult};
use super::session::TokenStore;
use crate::shared::{ApiResponse, NotificationList, NotificationStats};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifiedCount {
    modified_count: u64,
}

#[derive(Clone)]
pub struct NotificationsApi {
    config: ClientConfig,
    tokens: TokenStore,
    client: Client,
}

impl NotificationsApi {
    pub fn new(config: ClientConfig, tokens: TokenStore) -> Self {
        Self {
            config,
            tokens,
            client: Client::new(),
        }
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let tokens = TokenStore::from_path(config.token_path.as_deref());
        Self::new(config, tokens)
    }

    /// One page of notifications, newest first
    pub async fn list(&self, page: u32, limit: u32, unread_only: bool) -> ClientResult<NotificationList> {
        let request = self.request(Method::GET, "/notifications")?.query(&[
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("unreadOnly", unread_only.to_string()),
        ]);
        data(request).await
    }

    pub async fn stats(&self) -> ClientResult<NotificationStats> {
        data(self.request(Method::GET, "/notifications/stats")?).await
    }

    pub async fn unread_count(&self) -> ClientResult<u64> {
        Ok(self.stats().await?.unread)
    }

    pub async fn mark_read(&self, id: Uuid) -> ClientResult<()> {
        let path = format!("/notifications/{}/read", id);
        send(self.request(Method::PUT, &path)?).await?;
        Ok(())
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self) -> ClientResult<u64> {
        let counts: ModifiedCount = data(self.request(Method::PUT, "/notifications/read-all")?).await?;
        Ok(counts.modified_count)
    }

    pub async fn delete(&self, id: Uuid) -> ClientResult<()> {
        let path = format!("/notifications/{}", id);
        send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.tokens.load()?.ok_or(ClientError::MissingToken)?;
        Ok(self
            .client
            .request(method, self.config.api(path))
            .bearer_auth(token))
    }
}

async fn send(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiResponse<serde_json::Value>>().await {
        Ok(body) => body.message.unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    };
    tracing::warn!("[Client] Request failed: {} - {}", status, message);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn data<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = send(request).await?;
    let status = response.status().as_u16();
    let body: ApiResponse<T> = response.json().await?;
    match body.data {
        Some(data) if body.success => Ok(data),
        _ => Err(ClientError::Api {
            status,
            message: body.message.unwrap_or_else(|| "Response carried no data".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_missing_token_fails_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let api = NotificationsApi::new(ClientConfig::default(), TokenStore::at(dir.path().join("session.json")));

        assert_matches!(api.stats().await, Err(ClientError::MissingToken));
        assert_matches!(api.mark_read(Uuid::new_v4()).await, Err(ClientError::MissingToken));
    }
}
