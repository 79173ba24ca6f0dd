//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the bearer token; reconnecting with the same
    /// token is pointless
    #[error("Authentication rejected by the server. Obtain a fresh token and reconnect.")]
    AuthenticationRejected,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
