//! Error types for the transport layer.

use std::time::Duration;

use thiserror::Error;

use crate::api;

/// Errors that can occur while talking to the assistant API.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response arrived within the bounded wait.
    #[error("no response within {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The server answered with a status outside the success range.
    #[error("server rejected the request with status {status}")]
    ServerRejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No response at all (connection refused, DNS, reset).
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The call was abandoned before it resolved.
    #[error("request cancelled")]
    Cancelled,
}

/// Coarse classification of a [`TransportError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransportErrorKind {
    /// See [`TransportError::Timeout`].
    Timeout,
    /// See [`TransportError::ServerRejected`].
    ServerRejected,
    /// See [`TransportError::Unreachable`].
    Unreachable,
    /// See [`TransportError::Cancelled`].
    Cancelled,
}

impl TransportError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Timeout(_) => TransportErrorKind::Timeout,
            Self::ServerRejected { .. } => TransportErrorKind::ServerRejected,
            Self::Unreachable(_) => TransportErrorKind::Unreachable,
            Self::Cancelled => TransportErrorKind::Cancelled,
        }
    }

    /// HTTP status, for server rejections.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable detail carried by a server rejection.
    ///
    /// Prefers a `response`, `message` or `detail` string in a JSON body and
    /// falls back to the trimmed raw body. `None` when there is nothing to show.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let Self::ServerRejected { body, .. } = self else {
            return None;
        };
        api::error_detail(body).or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_json_fields() {
        let err = TransportError::ServerRejected {
            status: 500,
            body: r#"{"response":"overloaded"}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("overloaded"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.kind(), TransportErrorKind::ServerRejected);
    }

    #[test]
    fn test_detail_falls_back_to_raw_body() {
        let err = TransportError::ServerRejected {
            status: 502,
            body: "  Bad Gateway \n".to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("Bad Gateway"));

        let empty = TransportError::ServerRejected {
            status: 503,
            body: String::new(),
        };
        assert_eq!(empty.detail(), None);
        assert_eq!(TransportError::Cancelled.detail(), None);
    }

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "no response within 1500 ms");
        assert_eq!(err.kind(), TransportErrorKind::Timeout);
    }
}
