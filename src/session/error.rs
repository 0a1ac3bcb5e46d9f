//! Authentication errors.

use thiserror::Error;

use crate::transport::TransportError;

/// Fallback text when the server rejects a sign-in without explanation.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Sign-in was rejected. Check your user ID and password.";

/// Errors raised by the session controller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The authentication service rejected the credentials.
    #[error("{message}")]
    Rejected {
        /// Explanation taken from the rejection payload.
        message: String,
    },

    /// No user ID was supplied.
    #[error("Please enter a User ID to continue.")]
    MissingIdentity,

    /// No password was supplied.
    #[error("Please enter a password to continue.")]
    MissingCredential,

    /// A gated call was attempted without an authenticated session.
    #[error("not signed in")]
    NotAuthenticated,

    /// A sign-in is already running or a user is already signed in.
    #[error("a session is already active")]
    SessionActive,

    /// The authentication service could not be reached.
    #[error("authentication service unavailable: {0}")]
    Unavailable(TransportError),
}

impl AuthError {
    /// Translate a failed `/auth` call.
    ///
    /// Server rejections become [`AuthError::Rejected`] carrying the server's
    /// `message`; anything else means the service was unavailable.
    #[must_use]
    pub fn from_auth_failure(error: TransportError) -> Self {
        match &error {
            TransportError::ServerRejected { body, .. } => Self::Rejected {
                message: crate::api::error_detail(body)
                    .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
            },
            _ => Self::Unavailable(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_uses_server_message() {
        let err = AuthError::from_auth_failure(TransportError::ServerRejected {
            status: 401,
            body: r#"{"message":"Wrong password for alice"}"#.to_string(),
        });
        assert_eq!(err.to_string(), "Wrong password for alice");
    }

    #[test]
    fn test_rejection_without_message_uses_default() {
        let err = AuthError::from_auth_failure(TransportError::ServerRejected {
            status: 403,
            body: String::new(),
        });
        assert_eq!(err.to_string(), DEFAULT_REJECTION_MESSAGE);
    }

    #[test]
    fn test_network_failure_is_unavailable() {
        let err = AuthError::from_auth_failure(TransportError::Unreachable("refused".into()));
        assert!(matches!(err, AuthError::Unavailable(_)));
    }
}
