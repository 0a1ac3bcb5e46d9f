//! Crate-level error type.

use thiserror::Error;

use crate::api::MalformedResponse;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::transport::TransportError;

/// Errors surfaced while building or running the chat client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// A sanitizer pattern failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Authentication failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Success response missing expected fields.
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),

    /// IO error (terminal shell).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
