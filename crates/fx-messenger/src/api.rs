//! Messenger Send API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use fx_core::{HttpConfig, MessengerConfig};

use crate::error::{MessengerError, Result};
use crate::types::{OutboundMessage, PageProfile};

/// Delivers outbound messages to a user.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

/// Messenger Platform API client
#[derive(Clone)]
pub struct MessengerApi {
    client: Client,
    access_token: String,
    api_url: String,
}

impl MessengerApi {
    /// Create a new Messenger API client
    pub fn new(access_token: &str, api_url: &str, timeout: Duration) -> Result<Self> {
        if access_token.is_empty() {
            return Err(MessengerError::AccessTokenNotSet);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MessengerError::from)?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(messenger: &MessengerConfig, http: &HttpConfig) -> Result<Self> {
        Self::new(&messenger.page_access_token, &messenger.api_url, http.timeout())
    }

    /// Post a message or sender action to the Send API
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        debug!(
            "Sending to {}: {:?}",
            message.recipient.id, message.content
        );
        self.post_json("me/messages", message).await
    }

    /// Register greeting, "Get Started" button and persistent menu
    pub async fn set_messenger_profile(&self, profile: &PageProfile) -> Result<()> {
        self.post_json("me/messenger_profile", profile).await?;
        info!("Messenger profile registered");
        Ok(())
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = format!("{}/{}", self.api_url, path);

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", &self.access_token)])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Messenger API error: {} - {}", status, body);
            return Err(MessengerError::Api(format!("{} - {}", status, body)));
        }

        Ok(())
    }
}

#[async_trait]
impl MessageSender for MessengerApi {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.send_message(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SenderAction;
    use axum::{
        Json, Router,
        extract::{Query, State},
        http::StatusCode,
        routing::post,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, HashMap<String, String>, serde_json::Value)>>>;

    async fn spawn_graph_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();

        async fn record(
            State((status, captured)): State<(StatusCode, Captured)>,
            uri: axum::http::Uri,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<serde_json::Value>,
        ) -> StatusCode {
            captured
                .lock()
                .unwrap()
                .push((uri.path().to_string(), query, body));
            status
        }

        let app = Router::new()
            .route("/v3.1/me/messages", post(record))
            .route("/v3.1/me/messenger_profile", post(record))
            .with_state((status, captured.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v3.1", addr), captured)
    }

    #[test]
    fn test_requires_access_token() {
        let result = MessengerApi::new("", "https://graph.facebook.com/v3.1", Duration::from_secs(30));
        assert!(matches!(result, Err(MessengerError::AccessTokenNotSet)));
    }

    #[tokio::test]
    async fn test_send_message_posts_json_with_token() {
        let (url, captured) = spawn_graph_api(StatusCode::OK).await;
        let api = MessengerApi::new("page-token", &url, Duration::from_secs(5)).unwrap();

        api.send(&OutboundMessage::text("u1", "HELLO")).await.unwrap();
        api.send(&OutboundMessage::action("u1", SenderAction::MarkSeen))
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 2);

        let (path, query, body) = &captured[0];
        assert_eq!(path, "/v3.1/me/messages");
        assert_eq!(query.get("access_token").map(String::as_str), Some("page-token"));
        assert_eq!(body["messaging_type"], "RESPONSE");
        assert_eq!(body["recipient"]["id"], "u1");
        assert_eq!(body["message"]["text"], "HELLO");

        assert_eq!(captured[1].2["sender_action"], "mark_seen");
    }

    #[tokio::test]
    async fn test_set_messenger_profile() {
        let (url, captured) = spawn_graph_api(StatusCode::OK).await;
        let api = MessengerApi::new("page-token", &url, Duration::from_secs(5)).unwrap();

        api.set_messenger_profile(&PageProfile::default_profile())
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured[0].0, "/v3.1/me/messenger_profile");
        assert_eq!(captured[0].2["get_started"]["payload"], "GetStarted");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let (url, _captured) = spawn_graph_api(StatusCode::BAD_REQUEST).await;
        let api = MessengerApi::new("page-token", &url, Duration::from_secs(5)).unwrap();

        let result = api.send(&OutboundMessage::text("u1", "HELLO")).await;
        assert!(matches!(result, Err(MessengerError::Api(_))));
    }
}
