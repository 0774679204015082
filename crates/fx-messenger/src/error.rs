//! Error types for fx-messenger

use thiserror::Error;

/// fx-messenger error type
#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("Messenger page access token not set")]
    AccessTokenNotSet,

    #[error("Messenger API error: {0}")]
    Api(String),

    #[error("Messenger API request failed: {0}")]
    Request(String),

    #[error("Messenger webhook verification failed")]
    WebhookVerificationFailed,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Webhook server error: {0}")]
    Server(String),

    #[error("JSON serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for MessengerError {
    fn from(err: reqwest::Error) -> Self {
        MessengerError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for MessengerError {
    fn from(err: serde_json::Error) -> Self {
        MessengerError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MessengerError>;
