//! Messenger Platform types
//!
//! Inbound webhook envelope, outbound Send API payloads and the
//! messenger profile used for the greeting screen and persistent menu.

use serde::{Deserialize, Serialize};

/// `messaging_type` for replies to a user message
pub const MESSAGING_TYPE_RESPONSE: &str = "RESPONSE";

/// Postback payload of the "Get Started" button
pub const GET_STARTED_PAYLOAD: &str = "GetStarted";

/// Postback payload of the persistent menu entry, also the text command
pub const RATE_PAYLOAD: &str = "rate";

// =============================================================================
// Inbound webhook envelope
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    pub id: Option<String>,
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<Messaging>,
}

/// One messaging item of a webhook entry
#[derive(Debug, Clone, Deserialize)]
pub struct Messaging {
    pub sender: Option<User>,
    pub recipient: Option<User>,
    pub timestamp: Option<i64>,
    pub message: Option<WebhookMessage>,
    pub postback: Option<WebhookPostback>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    pub mid: Option<String>,
    pub text: Option<String>,
    pub quick_reply: Option<WebhookQuickReply>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookQuickReply {
    #[serde(default)]
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPostback {
    pub title: Option<String>,
    #[serde(default)]
    pub payload: String,
}

/// A messaging item reduced to what the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Typed text (possibly empty for attachment-only messages)
    Text { sender: String, text: String },
    /// Tap on a quick-reply button
    QuickReply { sender: String, payload: String },
    /// Tap on "Get Started" or a persistent menu item
    Postback { sender: String, payload: String },
}

impl InboundEvent {
    /// Classify a messaging item.
    ///
    /// Returns `None` for items without a sender and for deliveries, reads
    /// and other events that are neither messages nor postbacks.
    pub fn from_messaging(messaging: &Messaging) -> Option<Self> {
        let sender = messaging.sender.as_ref()?.id.clone();

        if let Some(message) = &messaging.message {
            if let Some(quick_reply) = &message.quick_reply {
                return Some(Self::QuickReply {
                    sender,
                    payload: quick_reply.payload.clone(),
                });
            }
            return Some(Self::Text {
                sender,
                text: message.text.clone().unwrap_or_default(),
            });
        }

        messaging.postback.as_ref().map(|postback| Self::Postback {
            sender,
            payload: postback.payload.clone(),
        })
    }

    pub fn sender(&self) -> &str {
        match self {
            Self::Text { sender, .. }
            | Self::QuickReply { sender, .. }
            | Self::Postback { sender, .. } => sender,
        }
    }
}

// =============================================================================
// Outbound Send API payloads
// =============================================================================

/// Envelope posted to the Send API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub messaging_type: String,
    pub recipient: User,
    #[serde(flatten)]
    pub content: OutboundContent,
}

/// Either a message body or a sender action, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundContent {
    Message(MessageBody),
    SenderAction(SenderAction),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBody {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub content_type: String,
    pub title: String,
    pub payload: String,
}

impl QuickReply {
    /// Text quick reply button
    pub fn text(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            title: title.into(),
            payload: payload.into(),
        }
    }
}

impl OutboundMessage {
    /// Plain text message
    pub fn text(recipient_id: &str, text: impl Into<String>) -> Self {
        Self::with_quick_replies(recipient_id, text, Vec::new())
    }

    /// Text with quick reply buttons
    pub fn with_quick_replies(
        recipient_id: &str,
        text: impl Into<String>,
        quick_replies: Vec<QuickReply>,
    ) -> Self {
        Self {
            messaging_type: MESSAGING_TYPE_RESPONSE.to_string(),
            recipient: User {
                id: recipient_id.to_string(),
            },
            content: OutboundContent::Message(MessageBody {
                text: text.into(),
                quick_replies,
            }),
        }
    }

    /// Seen / typing indicator
    pub fn action(recipient_id: &str, action: SenderAction) -> Self {
        Self {
            messaging_type: MESSAGING_TYPE_RESPONSE.to_string(),
            recipient: User {
                id: recipient_id.to_string(),
            },
            content: OutboundContent::SenderAction(action),
        }
    }

    pub fn message_text(&self) -> Option<&str> {
        match &self.content {
            OutboundContent::Message(body) => Some(&body.text),
            OutboundContent::SenderAction(_) => None,
        }
    }

    pub fn quick_replies(&self) -> &[QuickReply] {
        match &self.content {
            OutboundContent::Message(body) => &body.quick_replies,
            OutboundContent::SenderAction(_) => &[],
        }
    }

    pub fn sender_action(&self) -> Option<SenderAction> {
        match self.content {
            OutboundContent::SenderAction(action) => Some(action),
            OutboundContent::Message(_) => None,
        }
    }
}

// =============================================================================
// Messenger profile
// =============================================================================

/// Greeting, "Get Started" button and persistent menu of the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageProfile {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub greeting: Vec<Greeting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_started: Option<GetStarted>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persistent_menu: Vec<PersistentMenu>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Greeting {
    pub locale: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetStarted {
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistentMenu {
    pub locale: String,
    pub composer_input_disabled: bool,
    pub call_to_actions: Vec<CallToAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallToAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CallToAction {
    pub fn postback(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            action_type: "postback".to_string(),
            title: title.into(),
            payload: Some(payload.into()),
            url: None,
        }
    }
}

impl PageProfile {
    /// Profile of the exchange rate bot: one menu entry that starts the
    /// rate listing.
    pub fn default_profile() -> Self {
        Self {
            greeting: vec![Greeting {
                locale: "default".to_string(),
                text: "Exchange rate information service".to_string(),
            }],
            get_started: Some(GetStarted {
                payload: GET_STARTED_PAYLOAD.to_string(),
            }),
            persistent_menu: vec![PersistentMenu {
                locale: "default".to_string(),
                composer_input_disabled: false,
                call_to_actions: vec![CallToAction::postback("Exchange rates", RATE_PAYLOAD)],
            }],
        }
    }
}
