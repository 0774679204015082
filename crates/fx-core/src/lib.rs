//! fx-core: shared configuration and error types for fx-gateway
//!
//! Holds the settings every other crate reads: the webhook server port,
//! Messenger credentials and the bank rate feed endpoint.

pub mod config;
pub mod error;

pub use config::{Config, HttpConfig, MessengerConfig, RatesConfig, ServerConfig};
pub use error::{Error, Result};
