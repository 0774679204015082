//! fx-rates: foreign exchange rate feed for fx-gateway
//!
//! Fetches the bank's XML rate document, validates every `Exrate` entry
//! and returns the table sorted by currency name.

pub mod client;
pub mod error;
pub mod models;

pub use client::{parse_table, RateClient, RateSource};
pub use error::{RatesError, Result};
pub use models::{Entry, ExchangeRateTable};
