//! Webhook server for the Messenger Platform
//!
//! GET answers the subscription handshake, POST receives message and
//! postback events.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::{MessengerError, Result};
use crate::handler::MessageHandler;
use crate::types::WebhookPayload;

const GOT_MESSAGE: &str = "Got your message";
const NOT_SUPPORTED: &str = "Message not supported";
const WRONG_TOKEN: &str = "Error, wrong validation token";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub verify_token: String,
    pub handler: Arc<MessageHandler>,
}

/// Subscription handshake parameters
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Check the handshake and return the challenge to echo back
pub fn verify_webhook(expected_token: &str, params: &VerifyParams) -> Result<String> {
    let mode = params.mode.as_deref().unwrap_or_default();
    let token = params.verify_token.as_deref().unwrap_or_default();

    if mode == "subscribe" && token == expected_token {
        info!("Webhook verified successfully");
        Ok(params.challenge.clone().unwrap_or_default())
    } else {
        warn!("Webhook verification failed: invalid mode or token");
        Err(MessengerError::WebhookVerificationFailed)
    }
}

/// Create webhook router
pub fn create_webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(handle_verify).post(handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn handle_verify(
    State(state): State<Arc<WebhookState>>,
    params: std::result::Result<Query<VerifyParams>, QueryRejection>,
) -> (StatusCode, String) {
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!("Malformed verification query: {}", e);
            return (StatusCode::NOT_FOUND, WRONG_TOKEN.to_string());
        }
    };

    match verify_webhook(&state.verify_token, &params) {
        Ok(challenge) => (StatusCode::OK, challenge),
        Err(_) => (StatusCode::NOT_FOUND, WRONG_TOKEN.to_string()),
    }
}

/// Decode a POST body, accepting only `page` subscriptions
pub fn parse_payload(body: &[u8]) -> Result<WebhookPayload> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;

    if payload.object != "page" {
        return Err(MessengerError::InvalidPayload(format!(
            "unsupported object {:?}",
            payload.object
        )));
    }

    Ok(payload)
}

async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejecting webhook body: {}", e);
            return (StatusCode::NOT_FOUND, NOT_SUPPORTED);
        }
    };

    for entry in &payload.entry {
        for messaging in &entry.messaging {
            if let Err(e) = state.handler.handle_messaging(messaging).await {
                error!("Error handling messaging event: {}", e);
            }
        }
    }

    (StatusCode::OK, GOT_MESSAGE)
}

/// Serve the webhook on `0.0.0.0:port` until `shutdown` resolves
pub async fn start_webhook_server<F>(state: WebhookState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_webhook_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MessengerError::Server(e.to_string()))?;

    info!("Messenger webhook server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MessengerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InMemorySessionStore, PageState};
    use crate::testing::{RecordingSender, StaticRates, sample_table};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        sender: Arc<RecordingSender>,
        rates: Arc<StaticRates>,
        handler: Arc<MessageHandler>,
    }

    impl TestApp {
        fn new() -> Self {
            let sender = Arc::new(RecordingSender::default());
            let rates = Arc::new(StaticRates::new(sample_table(23)));
            let handler = Arc::new(MessageHandler::new(
                sender.clone(),
                rates.clone(),
                InMemorySessionStore::new(),
            ));
            let router = create_webhook_router(WebhookState {
                verify_token: "GoBot".to_string(),
                handler: handler.clone(),
            });
            Self {
                router,
                sender,
                rates,
                handler,
            }
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            self.call(req).await
        }

        async fn post(&self, body: &str) -> (StatusCode, String) {
            let req = Request::builder()
                .method(Method::POST)
                .uri("/")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.call(req).await
        }

        async fn call(&self, req: Request<Body>) -> (StatusCode, String) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }
    }

    fn page_event(sender: &str, message: serde_json::Value) -> String {
        serde_json::json!({
            "object": "page",
            "entry": [{
                "id": "page123",
                "time": 1458692752478i64,
                "messaging": [{
                    "sender": {"id": sender},
                    "recipient": {"id": "page123"},
                    "timestamp": 1458692752478i64,
                    "message": message
                }]
            }]
        })
        .to_string()
    }

    #[test]
    fn test_verify_webhook() {
        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("verify".to_string()),
            challenge: Some("challenge".to_string()),
        };
        assert_eq!(verify_webhook("verify", &params).unwrap(), "challenge");
        assert!(verify_webhook("other", &params).is_err());
        assert!(verify_webhook("verify", &VerifyParams::default()).is_err());
    }

    #[test]
    fn test_parse_payload() {
        let payload = parse_payload(br#"{"object": "page", "entry": [{"messaging": []}]}"#).unwrap();
        assert_eq!(payload.entry.len(), 1);

        assert!(matches!(
            parse_payload(br#"{"object": "user", "entry": []}"#),
            Err(MessengerError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_payload(b"{not json"),
            Err(MessengerError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_get_echoes_challenge() {
        let app = TestApp::new();
        let (status, body) = app
            .get("/?hub.mode=subscribe&hub.verify_token=GoBot&hub.challenge=xyz")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "xyz");
    }

    #[tokio::test]
    async fn test_get_wrong_token_is_404() {
        let app = TestApp::new();

        let (status, _) = app
            .get("/?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=xyz")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .get("/?hub.mode=unsubscribe&hub.verify_token=GoBot&hub.challenge=xyz")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, WRONG_TOKEN);
    }

    #[tokio::test]
    async fn test_post_text_is_echoed() {
        let app = TestApp::new();
        let (status, body) = app
            .post(&page_event("u1", serde_json::json!({"mid": "m1", "text": "hello"})))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, GOT_MESSAGE);

        let messages = app.sender.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_text(), Some("HELLO"));
        assert_eq!(app.sender.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_post_rate_then_next() {
        let app = TestApp::new();

        app.post(&page_event("u1", serde_json::json!({"text": " Rate "})))
            .await;
        assert_eq!(app.rates.calls(), 1);

        let (status, _) = app
            .post(&page_event(
                "u1",
                serde_json::json!({"text": "More", "quick_reply": {"payload": "Next"}}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            app.handler.sessions().get("u1").await,
            PageState::Paginated(2)
        );
    }

    #[tokio::test]
    async fn test_post_non_page_object_is_404() {
        let app = TestApp::new();

        let (status, body) = app
            .post(r#"{"object": "user", "entry": [{"messaging": [{"sender": {"id": "u1"}, "message": {"text": "hi"}}]}]}"#)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_SUPPORTED);
        assert!(app.sender.sent().is_empty());

        let (status, body) = app.post(r#"{"entry": []}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_SUPPORTED);
    }

    #[tokio::test]
    async fn test_post_malformed_json_is_404() {
        let app = TestApp::new();
        let (status, body) = app.post("{not json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_SUPPORTED);
    }

    #[tokio::test]
    async fn test_post_succeeds_when_sending_fails() {
        let sender = Arc::new(RecordingSender::failing());
        let handler = Arc::new(MessageHandler::new(
            sender.clone(),
            Arc::new(StaticRates::new(sample_table(3))),
            InMemorySessionStore::new(),
        ));
        let router = create_webhook_router(WebhookState {
            verify_token: "GoBot".to_string(),
            handler,
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(page_event("u1", serde_json::json!({"text": "hello"}))))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(sender.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_post_processes_every_event() {
        let app = TestApp::new();
        let body = serde_json::json!({
            "object": "page",
            "entry": [
                {"messaging": [
                    {"sender": {"id": "u1"}, "message": {"text": "one"}},
                    {"sender": {"id": "u1"}, "delivery": {"watermark": 1}}
                ]},
                {"messaging": [
                    {"sender": {"id": "u2"}, "postback": {"payload": "GetStarted"}}
                ]}
            ]
        })
        .to_string();

        let (status, _) = app.post(&body).await;
        assert_eq!(status, StatusCode::OK);

        let messages = app.sender.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_text(), Some("ONE"));
        assert_eq!(messages[1].recipient.id, "u2");
        assert_eq!(messages[1].quick_replies().len(), 11);
    }
}
