//! Decoding errors for API responses.

use thiserror::Error;

/// A success response that lacks the fields the client expects.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("malformed {endpoint} response: {reason}")]
pub struct MalformedResponse {
    /// Endpoint name (`chat`, `history`).
    pub endpoint: &'static str,
    /// What was wrong with the body.
    pub reason: String,
}

impl MalformedResponse {
    /// Build a new decoding error.
    #[must_use]
    pub fn new(endpoint: &'static str, reason: impl Into<String>) -> Self {
        Self {
            endpoint,
            reason: reason.into(),
        }
    }
}
