//! Authentication state and credential lifecycle.
//!
//! - `Session`: who is signed in and in which state
//! - `SessionController`: the only place a `Session` is mutated
//! - `AuthError`: sign-in and gating failures

pub mod controller;
pub mod error;

pub use controller::{SessionController, SignInAttempt};
pub use error::AuthError;

use std::fmt;

use secrecy::SecretString;

/// Authentication state of a session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// A sign-in call is in flight.
    Authenticating,
    /// The server accepted the credentials.
    Authenticated,
}

impl SessionState {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The signed-in user, if any.
///
/// Invariant: `credential` is present iff `state` is `Authenticated`. The
/// credential lives in memory only and is zeroized when dropped.
#[derive(Debug, Default)]
pub struct Session {
    identity: String,
    credential: Option<SecretString>,
    state: SessionState,
}

impl Session {
    /// An anonymous session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// User ID of the session (empty when anonymous).
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session may make gated calls.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated)
    }

    /// Whether a credential is held.
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}
