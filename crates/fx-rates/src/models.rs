//! Data models for the exchange rate table

use chrono::{DateTime, Utc};

use crate::error::{RatesError, Result};

/// One currency row of the bank feed.
///
/// Prices are kept exactly as published (e.g. `"23,150.00"` or `"-"`), so
/// they can be passed through to users without locale-dependent parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// ISO currency code, e.g. `USD`
    pub currency_code: String,
    /// Display name, e.g. `US DOLLAR`
    pub currency_name: String,
    /// Cash buying price
    pub buy: String,
    /// Selling price
    pub sell: String,
    /// Transfer buying price
    pub transfer: String,
}

impl Entry {
    /// Create a new entry
    pub fn new(
        currency_code: impl Into<String>,
        currency_name: impl Into<String>,
        buy: impl Into<String>,
        sell: impl Into<String>,
        transfer: impl Into<String>,
    ) -> Self {
        Self {
            currency_code: currency_code.into(),
            currency_name: currency_name.into(),
            buy: buy.into(),
            sell: sell.into(),
            transfer: transfer.into(),
        }
    }

    /// Check the code and price formats.
    pub fn validate(&self) -> Result<()> {
        let code = &self.currency_code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RatesError::InvalidEntry(format!(
                "bad currency code {:?}",
                code
            )));
        }

        for (field, value) in [("Buy", &self.buy), ("Sell", &self.sell), ("Transfer", &self.transfer)] {
            if !is_price(value) {
                return Err(RatesError::InvalidEntry(format!(
                    "{}: bad {} price {:?}",
                    code, field, value
                )));
            }
        }

        Ok(())
    }
}

/// `-` marks a price the bank does not quote.
fn is_price(value: &str) -> bool {
    if value == "-" {
        return true;
    }
    value.chars().any(|c| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

/// Exchange rate table as published by the bank
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateTable {
    /// Publication time, verbatim from the feed
    pub date_time: String,
    /// Source label
    pub source: String,
    /// Entries sorted by currency name
    pub entries: Vec<Entry>,
    /// When this table was fetched
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ExchangeRateTable {
    /// Create a table and sort its entries by name
    pub fn new(date_time: impl Into<String>, source: impl Into<String>, entries: Vec<Entry>) -> Self {
        let mut table = Self {
            date_time: date_time.into(),
            source: source.into(),
            entries,
            fetched_at: None,
        };
        table.sort_by_name();
        table
    }

    /// Empty table, used when nothing has been fetched
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stable sort by currency name, so equal names keep feed order
    pub fn sort_by_name(&mut self) {
        self.entries
            .sort_by(|a, b| a.currency_name.cmp(&b.currency_name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
