//! Event dispatcher for the exchange rate bot

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use fx_rates::{Entry, ExchangeRateTable, RateSource};

use crate::api::MessageSender;
use crate::error::Result;
use crate::paging::{self, NEXT_PAYLOAD};
use crate::session::InMemorySessionStore;
use crate::types::{
    GET_STARTED_PAYLOAD, InboundEvent, Messaging, OutboundMessage, RATE_PAYLOAD, SenderAction,
};

pub const PAGE_PROMPT: &str = "This bot shows exchange rates between foreign currencies and the Vietnamese dong.\nPlease choose a currency:";
pub const NOT_FOUND_REPLY: &str = "No information about this currency.";
pub const RETRY_REPLY: &str = "Something went wrong while fetching exchange rates. Please try again later by sending 'rate'. Thank you!";

/// Text command that starts the rate listing (case-insensitive, trimmed)
pub fn is_rate_command(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(RATE_PAYLOAD)
}

pub fn format_rate(entry: &Entry) -> String {
    format!(
        "{}-VND\nBuy: {}\nSell: {}\nTransfer: {}",
        entry.currency_code,
        dong(&entry.buy),
        dong(&entry.sell),
        dong(&entry.transfer)
    )
}

/// Price with the dong sign; `-` (not traded) stays bare
fn dong(price: &str) -> String {
    if price == "-" {
        price.to_string()
    } else {
        format!("{}đ", price)
    }
}

/// Routes inbound events and owns the bot state: the latest rate table and
/// each user's page.
pub struct MessageHandler {
    sender: Arc<dyn MessageSender>,
    rates: Arc<dyn RateSource>,
    sessions: InMemorySessionStore,
    table: RwLock<Arc<ExchangeRateTable>>,
}

impl MessageHandler {
    /// Create a new message handler
    pub fn new(
        sender: Arc<dyn MessageSender>,
        rates: Arc<dyn RateSource>,
        sessions: InMemorySessionStore,
    ) -> Self {
        Self {
            sender,
            rates,
            sessions,
            table: RwLock::new(Arc::new(ExchangeRateTable::empty())),
        }
    }

    pub fn sessions(&self) -> &InMemorySessionStore {
        &self.sessions
    }

    /// Snapshot of the current rate table
    pub async fn table(&self) -> Arc<ExchangeRateTable> {
        self.table.read().await.clone()
    }

    /// Handle one messaging item of a webhook entry
    pub async fn handle_messaging(&self, messaging: &Messaging) -> Result<()> {
        match InboundEvent::from_messaging(messaging) {
            Some(event) => self.handle_event(&event).await,
            None => {
                if messaging.sender.is_none()
                    && (messaging.message.is_some() || messaging.postback.is_some())
                {
                    warn!("No sender ID in messaging event");
                } else {
                    debug!("Ignoring non-message event");
                }
                Ok(())
            }
        }
    }

    /// Acknowledge, dispatch, then stop the typing indicator even when
    /// dispatching failed.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<()> {
        let recipient = event.sender();

        self.send_action(recipient, SenderAction::MarkSeen).await;
        self.send_action(recipient, SenderAction::TypingOn).await;

        let outcome = match event {
            InboundEvent::Text { text, .. } => self.handle_text(recipient, text).await,
            InboundEvent::QuickReply { payload, .. } => {
                self.handle_quick_reply(recipient, payload).await
            }
            InboundEvent::Postback { payload, .. } => self.handle_postback(recipient, payload).await,
        };

        self.send_action(recipient, SenderAction::TypingOff).await;
        outcome
    }

    async fn handle_text(&self, recipient: &str, text: &str) -> Result<()> {
        info!("Received message from {}: {}", recipient, text);

        if is_rate_command(text) {
            return self.start_rate_listing(recipient).await;
        }

        if text.is_empty() {
            debug!("Ignoring message without text from {}", recipient);
            return Ok(());
        }

        self.send(OutboundMessage::text(recipient, text.to_uppercase()))
            .await
    }

    async fn handle_quick_reply(&self, recipient: &str, payload: &str) -> Result<()> {
        info!("Quick reply from {}: {}", recipient, payload);

        let table = self.table().await;

        if payload == NEXT_PAYLOAD {
            if table.is_empty() {
                warn!("Next requested by {} but no rate table is loaded", recipient);
                return self.send(OutboundMessage::text(recipient, RETRY_REPLY)).await;
            }

            let page = self.sessions.advance(recipient, table.len()).await;
            debug!("User {} moved to page {}", recipient, page);
            return self.send_page(recipient, &table, page).await;
        }

        let state = self.sessions.get(recipient).await;
        let reply = match paging::find_in_page(&table.entries, state, payload) {
            Some(entry) => format_rate(entry),
            None => {
                debug!("Currency {} not on page {:?} of {}", payload, state, recipient);
                NOT_FOUND_REPLY.to_string()
            }
        };

        self.send(OutboundMessage::text(recipient, reply)).await
    }

    async fn handle_postback(&self, recipient: &str, payload: &str) -> Result<()> {
        info!("Postback from {}: {}", recipient, payload);

        match payload {
            GET_STARTED_PAYLOAD | RATE_PAYLOAD => self.start_rate_listing(recipient).await,
            _ => {
                debug!("Ignoring unknown postback payload {}", payload);
                Ok(())
            }
        }
    }

    /// Reset to page 1, refetch the table and show the first page.
    async fn start_rate_listing(&self, recipient: &str) -> Result<()> {
        self.sessions.reset(recipient).await;

        match self.rates.fetch().await {
            Ok(table) => {
                let table = Arc::new(table);
                *self.table.write().await = table.clone();
                self.send_page(recipient, &table, 1).await
            }
            Err(e) => {
                error!("Failed to fetch exchange rates: {}", e);
                *self.table.write().await = Arc::new(ExchangeRateTable::empty());
                self.send(OutboundMessage::text(recipient, RETRY_REPLY)).await
            }
        }
    }

    async fn send_page(&self, recipient: &str, table: &ExchangeRateTable, page: usize) -> Result<()> {
        let buttons = paging::page_buttons(&table.entries, page);
        self.send(OutboundMessage::with_quick_replies(recipient, PAGE_PROMPT, buttons))
            .await
    }

    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.sender.send(&message).await
    }

    /// Sender actions are best effort
    async fn send_action(&self, recipient: &str, action: SenderAction) {
        if let Err(e) = self.send(OutboundMessage::action(recipient, action)).await {
            warn!("Failed to send {:?} to {}: {}", action, recipient, e);
        }
    }
}
