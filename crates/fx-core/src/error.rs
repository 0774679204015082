//! Error types for fx-core

use thiserror::Error;

/// Main error type for fx-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fx-core
pub type Result<T> = std::result::Result<T, Error>;
