//! Submission state machine.
//!
//! The orchestrator is a synchronous dispatcher: it consumes one [`Event`]
//! at a time, mutates the session and the conversation log, and returns the
//! [`Command`]s the caller must carry out. It performs no I/O, so every
//! transition can be exercised headlessly.
//!
//! Network completions carry the epoch or request id they answer. A
//! completion that no longer matches the current state (the user signed out,
//! switched user, or the request was superseded) is dropped.

use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api;
use crate::config::ClientConfig;
use crate::sanitize::Sanitizer;
use crate::session::{Session, SessionController, SessionState};
use crate::transport::TransportError;

use super::conversation::ConversationLog;
use super::events::{Command, ConfirmAction, Event, Rejection};
use super::ids::RequestId;
use super::message::Message;

/// Shown when a chat reply has no usable `response`.
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I'm having trouble thinking right now. Could you repeat that?";

/// Shown when the chat call never reached the server.
pub const CONNECTION_LOST_MESSAGE: &str =
    "I lost my connection to the study server. Please check your internet.";

/// Shown when the chat call exceeded its bounded wait.
pub const TIMEOUT_MESSAGE: &str = "The study server is taking longer than usual to answer. \
It may be waking up after a period of inactivity, which can take up to a minute. \
Please wait a moment and send your question again.";

/// The chat request currently in flight.
#[derive(Debug)]
pub struct PendingRequest {
    id: RequestId,
    cancel: CancellationToken,
}

impl PendingRequest {
    fn new() -> Self {
        Self {
            id: RequestId::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Identifier of the request.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }
}

/// Submission state.
#[derive(Debug, Default)]
pub enum Phase {
    /// Ready for a new submission.
    #[default]
    Idle,
    /// One chat request is in flight.
    Submitting(PendingRequest),
}

/// History request in flight for the current session.
#[derive(Clone, Copy, Debug)]
struct HistorySync {
    epoch: u64,
    /// Log entries (the welcome) that the history replaces.
    replaces: usize,
}

/// Coordinates user actions against the session, transport and log.
#[derive(Debug)]
pub struct Orchestrator {
    config: ClientConfig,
    sanitizer: Sanitizer,
    session: SessionController,
    log: ConversationLog,
    phase: Phase,
    history: Option<HistorySync>,
}

impl Orchestrator {
    /// Create an orchestrator with an anonymous session and empty log.
    ///
    /// # Errors
    /// Returns an error if the sanitizer patterns fail to compile.
    pub fn new(config: ClientConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            config,
            sanitizer: Sanitizer::new()?,
            session: SessionController::new(),
            log: ConversationLog::new(),
            phase: Phase::Idle,
            history: None,
        })
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        self.session.session()
    }

    /// Conversation log.
    #[must_use]
    pub const fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Submission state.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a chat request is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting(_))
    }

    /// Whether a history request is in flight.
    #[must_use]
    pub const fn is_syncing_history(&self) -> bool {
        self.history.is_some()
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Apply one event and return the commands it produces.
    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        debug!(event = event.name(), state = %self.session().state(), "dispatch");
        match event {
            Event::SignInRequested {
                identity,
                credential,
            } => self.on_sign_in_requested(&identity, credential),
            Event::SignInResolved { epoch, outcome } => self.on_sign_in_resolved(epoch, outcome),
            Event::HistoryResolved { epoch, outcome } => self.on_history_resolved(epoch, outcome),
            Event::SubmitRequested { text } => self.on_submit(&text),
            Event::ResponseReceived { request, outcome } => self.on_response(request, outcome),
            Event::Timeout { request } => {
                let timeout = self.config.chat_timeout;
                self.on_response(request, Err(TransportError::Timeout(timeout)))
            }
            Event::SignOutRequested { confirmed } => {
                self.on_end_session(ConfirmAction::SignOut, confirmed)
            }
            Event::SwitchUserRequested { confirmed } => {
                self.on_end_session(ConfirmAction::SwitchUser, confirmed)
            }
        }
    }

    fn on_sign_in_requested(&mut self, identity: &str, credential: SecretString) -> Vec<Command> {
        match self.session().state() {
            SessionState::Authenticating => return vec![Command::Rejected(Rejection::SignInInProgress)],
            SessionState::Authenticated => return vec![Command::Rejected(Rejection::AlreadySignedIn)],
            SessionState::Anonymous => {}
        }

        match self
            .session
            .begin_sign_in(identity, credential, self.config.auth_timeout)
        {
            Ok(attempt) => vec![Command::Authenticate {
                epoch: attempt.epoch,
                call: attempt.call,
            }],
            Err(error) => vec![Command::Alert {
                message: error.to_string(),
            }],
        }
    }

    fn on_sign_in_resolved(
        &mut self,
        epoch: u64,
        outcome: Result<Value, TransportError>,
    ) -> Vec<Command> {
        if !self.session.is_current(epoch) || self.session().state() != SessionState::Authenticating
        {
            debug!(epoch, "ignoring stale sign-in result");
            return Vec::new();
        }

        if let Err(error) = self.session.complete_sign_in(outcome) {
            return vec![Command::Alert {
                message: error.to_string(),
            }];
        }

        self.log.clear();
        if self.config.welcome_message {
            let welcome = format!(
                "Profile connected: {}. Your study history has been synced.",
                self.session().identity()
            );
            self.log.push(Message::notice(&welcome));
        }

        match self
            .session
            .history_call(self.config.history_mode, self.config.history_timeout)
        {
            Ok(call) => {
                self.history = Some(HistorySync {
                    epoch: self.session.epoch(),
                    replaces: self.log.len(),
                });
                vec![Command::FetchHistory {
                    epoch: self.session.epoch(),
                    call,
                }]
            }
            Err(error) => {
                warn!("cannot request history: {error}");
                Vec::new()
            }
        }
    }

    fn on_history_resolved(
        &mut self,
        epoch: u64,
        outcome: Result<Value, TransportError>,
    ) -> Vec<Command> {
        let sync = match self.history {
            Some(sync) if sync.epoch == epoch && self.session.is_current(epoch) => sync,
            _ => {
                debug!(epoch, "ignoring stale history result");
                return Vec::new();
            }
        };
        self.history = None;

        let entries = match outcome
            .map_err(|e| e.to_string())
            .and_then(|body| api::decode_history(body).map_err(|e| e.to_string()))
        {
            Ok(entries) => entries,
            Err(reason) => {
                warn!("history unavailable, keeping current log: {reason}");
                return Vec::new();
            }
        };

        if entries.is_empty() {
            debug!("no stored history");
            return Vec::new();
        }

        let restored: Vec<Message> = entries
            .iter()
            .map(|entry| Message::from_history(entry, &self.sanitizer))
            .collect();
        info!(count = restored.len(), "history restored");
        self.log.replace_prefix(sync.replaces, restored);
        Vec::new()
    }

    fn on_submit(&mut self, text: &str) -> Vec<Command> {
        let question = text.trim();
        if question.is_empty() {
            return vec![Command::Rejected(Rejection::EmptyMessage)];
        }
        if !self.session().is_authenticated() {
            return vec![Command::Rejected(Rejection::NotSignedIn)];
        }
        if self.is_submitting() {
            debug!("submission rejected: request in flight");
            return vec![Command::Rejected(Rejection::RequestInFlight)];
        }

        let Ok(call) = self.session.chat_call(question, self.config.chat_timeout) else {
            return vec![Command::Rejected(Rejection::NotSignedIn)];
        };

        let pending = PendingRequest::new();
        let command = Command::SendChat {
            request: pending.id,
            cancel: pending.cancel.clone(),
            call,
        };
        self.log.push(Message::user(question));
        self.log.show_pending(pending.id);
        debug!(request = %pending.id, "submitting");
        self.phase = Phase::Submitting(pending);
        vec![command]
    }

    fn on_response(
        &mut self,
        request: RequestId,
        outcome: Result<Value, TransportError>,
    ) -> Vec<Command> {
        match &self.phase {
            Phase::Submitting(pending) if pending.id == request => {}
            _ => {
                debug!(%request, "ignoring stale chat result");
                return Vec::new();
            }
        }
        self.phase = Phase::Idle;
        self.log.clear_pending();

        let reply = match outcome {
            Ok(body) => api::decode_chat_reply(body).unwrap_or_else(|error| {
                warn!("{error}");
                APOLOGY_MESSAGE.to_string()
            }),
            Err(error) => match Self::failure_notice(&error) {
                Some(notice) => {
                    warn!(%request, "chat request failed: {error}");
                    notice
                }
                None => return Vec::new(),
            },
        };

        self.log.push(Message::bot(&reply, &self.sanitizer));
        Vec::new()
    }

    /// Log entry for a failed chat call; `None` when nothing should be shown.
    fn failure_notice(error: &TransportError) -> Option<String> {
        match error {
            TransportError::Timeout(_) => Some(TIMEOUT_MESSAGE.to_string()),
            TransportError::Unreachable(_) => Some(CONNECTION_LOST_MESSAGE.to_string()),
            TransportError::ServerRejected { status, .. } => Some(match error.detail() {
                Some(detail) => format!("The study server returned status {status}: {detail}"),
                None => format!("The study server returned status {status}."),
            }),
            TransportError::Cancelled => None,
        }
    }

    fn on_end_session(&mut self, action: ConfirmAction, confirmed: bool) -> Vec<Command> {
        if !confirmed {
            return vec![Command::ConfirmationRequired(action)];
        }

        if let Phase::Submitting(pending) = std::mem::take(&mut self.phase) {
            debug!(request = %pending.id, "cancelling in-flight request");
            pending.cancel.cancel();
        }
        self.history = None;
        self.log.clear();
        self.session.sign_out();
        info!(?action, "session ended");
        Vec::new()
    }
}
