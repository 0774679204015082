//! fx-messenger: Facebook Messenger front end of fx-gateway
//!
//! Webhook server, Send API client and the dispatcher that pages users
//! through the bank's exchange rate table.

pub mod api;
pub mod error;
pub mod handler;
pub mod paging;
pub mod session;
pub mod types;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use api::{MessageSender, MessengerApi};
pub use error::{MessengerError, Result};
pub use handler::MessageHandler;
pub use session::{InMemorySessionStore, PageState};
pub use types::{InboundEvent, OutboundMessage, PageProfile};
pub use webhook::{WebhookState, create_webhook_router, parse_payload, start_webhook_server};
