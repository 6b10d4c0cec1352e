//! Common error types for the solar audit workspace

use thiserror::Error;

/// Common result type for solar audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the relay and the review client
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input (coordinates, payloads)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
