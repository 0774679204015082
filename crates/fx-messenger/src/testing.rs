//! Test doubles for the sender and rate source seams

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use fx_rates::{Entry, ExchangeRateTable, RateSource, RatesError};

use crate::api::MessageSender;
use crate::error::{MessengerError, Result};
use crate::types::OutboundMessage;

/// Records everything it is asked to send.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutboundMessage>>,
    fail: bool,
}

impl RecordingSender {
    /// Records, then reports every send as failed
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent messages without the sender actions
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.sender_action().is_none())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(MessengerError::Request("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Serves a fixed table and counts fetches.
pub struct StaticRates {
    table: ExchangeRateTable,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticRates {
    pub fn new(table: ExchangeRateTable) -> Self {
        Self {
            table,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RateSource for StaticRates {
    async fn fetch(&self) -> fx_rates::Result<ExchangeRateTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RatesError::HttpError("operation timed out".to_string()));
        }
        Ok(self.table.clone())
    }
}

/// `n` entries `C00..`, already in name order; prices derive from the index.
pub fn sample_table(n: usize) -> ExchangeRateTable {
    let entries = (0..n)
        .map(|i| {
            Entry::new(
                format!("C{:02}", i),
                format!("CURRENCY {:02}", i),
                format!("{}.00", i),
                format!("{}.20", i),
                format!("{}.10", i),
            )
        })
        .collect();
    ExchangeRateTable::new("10/16/2026 9:00:00 AM", "Test Bank", entries)
}
