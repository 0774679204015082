//! Error types for fx-rates

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// fx-rates error type
#[derive(Error, Debug)]
pub enum RatesError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Rate feed returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("XML parsing error: {0}")]
    XmlParseError(String),

    #[error("Invalid rate entry: {0}")]
    InvalidEntry(String),
}

impl From<reqwest::Error> for RatesError {
    fn from(err: reqwest::Error) -> Self {
        RatesError::HttpError(err.to_string())
    }
}

impl From<quick_xml::Error> for RatesError {
    fn from(err: quick_xml::Error) -> Self {
        RatesError::XmlParseError(err.to_string())
    }
}

impl From<AttrError> for RatesError {
    fn from(err: AttrError) -> Self {
        RatesError::XmlParseError(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RatesError>;
