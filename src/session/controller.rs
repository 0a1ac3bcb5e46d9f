//! Session controller: sign-in, sign-out and request gating.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api;
use crate::config::HistoryMode;
use crate::transport::{Call, Endpoint, TransportError};

use super::{AuthError, Session, SessionState};

/// An accepted sign-in request, ready to be sent.
#[derive(Debug)]
pub struct SignInAttempt {
    /// Session epoch the attempt belongs to.
    pub epoch: u64,
    /// The `/auth` call.
    pub call: Call,
}

/// Owns the [`Session`] and every transition of it.
///
/// Each sign-in and sign-out starts a new epoch. Completions tagged with an
/// older epoch belong to a session that no longer exists.
#[derive(Debug, Default)]
pub struct SessionController {
    session: Session,
    /// Credential of the sign-in in flight; moves into the session on success.
    attempt: Option<SecretString>,
    epoch: u64,
}

impl SessionController {
    /// Create a controller with an anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Current session epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether `epoch` is the current session epoch.
    #[must_use]
    pub const fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Validate the input and move to `Authenticating`.
    ///
    /// # Errors
    /// Returns [`AuthError::MissingIdentity`] / [`AuthError::MissingCredential`]
    /// for blank input and [`AuthError::SessionActive`] unless anonymous.
    pub fn begin_sign_in(
        &mut self,
        identity: &str,
        credential: SecretString,
        timeout: Duration,
    ) -> Result<SignInAttempt, AuthError> {
        if self.session.state != SessionState::Anonymous {
            return Err(AuthError::SessionActive);
        }
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AuthError::MissingIdentity);
        }
        if credential.expose_secret().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let payload = api::auth_payload(identity, credential.expose_secret());
        self.epoch += 1;
        self.session.identity = identity.to_string();
        self.session.state = SessionState::Authenticating;
        self.attempt = Some(credential);
        debug!(identity, epoch = self.epoch, "sign-in started");

        Ok(SignInAttempt {
            epoch: self.epoch,
            call: Call::new(Endpoint::Auth, Some(payload), timeout),
        })
    }

    /// Apply the outcome of the `/auth` call started by [`Self::begin_sign_in`].
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] when no sign-in is in flight,
    /// otherwise the translated failure; the session is then anonymous again.
    pub fn complete_sign_in(
        &mut self,
        outcome: Result<Value, TransportError>,
    ) -> Result<&Session, AuthError> {
        if self.session.state != SessionState::Authenticating {
            return Err(AuthError::NotAuthenticated);
        }
        let Some(credential) = self.attempt.take() else {
            return Err(AuthError::NotAuthenticated);
        };

        match outcome {
            Ok(_) => {
                self.session.credential = Some(credential);
                self.session.state = SessionState::Authenticated;
                info!(identity = %self.session.identity, "signed in");
                Ok(&self.session)
            }
            Err(error) => {
                warn!(identity = %self.session.identity, "sign-in failed: {error}");
                self.reset();
                Err(AuthError::from_auth_failure(error))
            }
        }
    }

    /// End the session. Always succeeds; the credential is dropped at once.
    pub fn sign_out(&mut self) {
        if self.session.state != SessionState::Anonymous {
            info!(identity = %self.session.identity, "signed out");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.session = Session::anonymous();
        self.attempt = None;
    }

    /// Identity and credential for a gated call.
    fn credentials(&self) -> Result<(&str, &SecretString), AuthError> {
        match (&self.session.state, &self.session.credential) {
            (SessionState::Authenticated, Some(credential)) => {
                Ok((&self.session.identity, credential))
            }
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    /// Build the `/chat` call for `question`.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a credential.
    pub fn chat_call(&self, question: &str, timeout: Duration) -> Result<Call, AuthError> {
        let (identity, credential) = self.credentials()?;
        let payload = api::chat_payload(question, identity, credential.expose_secret());
        Ok(Call::new(Endpoint::Chat, Some(payload), timeout))
    }

    /// Build the history call for the configured variant.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a credential, for
    /// both variants.
    pub fn history_call(&self, mode: HistoryMode, timeout: Duration) -> Result<Call, AuthError> {
        let (identity, credential) = self.credentials()?;
        let call = match mode {
            HistoryMode::Post => Call::new(
                Endpoint::History,
                Some(api::history_payload(identity, credential.expose_secret())),
                timeout,
            ),
            HistoryMode::Get => Call::new(Endpoint::HistoryFor(identity.to_string()), None, timeout),
        };
        Ok(call)
    }
}
