//! Error types for the chat relay.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the chat service.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials not found.
    #[error("credentials not found: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The service answered with a non-zero status code.
    #[error("provider API error {code}: {message}")]
    ProviderApi { code: i64, message: String },

    /// Connecting, sending or receiving failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The configured endpoint is not a usable WebSocket URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The session closed before the final chunk arrived.
    #[error("connection closed before the reply finished")]
    ConnectionClosed,

    /// No reply within the allowed time.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Request(err.to_string())
    }
}
