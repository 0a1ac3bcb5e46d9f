//! Typed events consumed and commands produced by the orchestrator.

use std::fmt;

use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::transport::{Call, TransportError};

use super::ids::RequestId;

/// Input to [`super::Orchestrator::dispatch`].
#[derive(Debug)]
pub enum Event {
    /// The user asked to sign in.
    SignInRequested {
        /// User ID as typed.
        identity: String,
        /// Password as typed.
        credential: SecretString,
    },
    /// The `/auth` call for `epoch` resolved.
    SignInResolved {
        /// Session epoch of the attempt.
        epoch: u64,
        /// Transport outcome.
        outcome: Result<Value, TransportError>,
    },
    /// The history call for `epoch` resolved.
    HistoryResolved {
        /// Session epoch the history was requested for.
        epoch: u64,
        /// Transport outcome.
        outcome: Result<Value, TransportError>,
    },
    /// The user submitted a chat message.
    SubmitRequested {
        /// Text as typed.
        text: String,
    },
    /// The chat call for `request` resolved (anything but a timeout).
    ResponseReceived {
        /// Request the outcome belongs to.
        request: RequestId,
        /// Transport outcome.
        outcome: Result<Value, TransportError>,
    },
    /// The chat call for `request` exceeded its bounded wait.
    Timeout {
        /// Request that timed out.
        request: RequestId,
    },
    /// The user asked to sign out.
    SignOutRequested {
        /// Whether the user already confirmed.
        confirmed: bool,
    },
    /// The user asked to switch to another user.
    SwitchUserRequested {
        /// Whether the user already confirmed.
        confirmed: bool,
    },
}

impl Event {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignInRequested { .. } => "sign_in_requested",
            Self::SignInResolved { .. } => "sign_in_resolved",
            Self::HistoryResolved { .. } => "history_resolved",
            Self::SubmitRequested { .. } => "submit_requested",
            Self::ResponseReceived { .. } => "response_received",
            Self::Timeout { .. } => "timeout",
            Self::SignOutRequested { .. } => "sign_out_requested",
            Self::SwitchUserRequested { .. } => "switch_user_requested",
        }
    }
}

/// Destructive actions that need the user's confirmation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ConfirmAction {
    /// End the session.
    SignOut,
    /// End the session to sign in as someone else.
    SwitchUser,
}

impl ConfirmAction {
    /// Question to put to the user.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::SignOut => "Sign out? The current conversation will be cleared.",
            Self::SwitchUser => {
                "Switch user? Current session will be ended and new history will load."
            }
        }
    }
}

/// Why a user action was refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Rejection {
    /// The message was empty after trimming.
    EmptyMessage,
    /// No authenticated session.
    NotSignedIn,
    /// A chat request is already in flight.
    RequestInFlight,
    /// A sign-in is already in flight.
    SignInInProgress,
    /// A user is already signed in.
    AlreadySignedIn,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyMessage => "message is empty",
            Self::NotSignedIn => "sign in before chatting",
            Self::RequestInFlight => "still waiting for the previous answer",
            Self::SignInInProgress => "sign-in already in progress",
            Self::AlreadySignedIn => "already signed in; sign out or switch user first",
        };
        f.write_str(text)
    }
}

/// Output of [`super::Orchestrator::dispatch`].
#[derive(Debug)]
pub enum Command {
    /// Send the `/auth` call; answer with [`Event::SignInResolved`].
    Authenticate {
        /// Session epoch of the attempt.
        epoch: u64,
        /// The call to send.
        call: Call,
    },
    /// Send the history call; answer with [`Event::HistoryResolved`].
    FetchHistory {
        /// Session epoch the history belongs to.
        epoch: u64,
        /// The call to send.
        call: Call,
    },
    /// Send the chat call; answer with [`Event::ResponseReceived`] or
    /// [`Event::Timeout`]. Abandon the call when `cancel` fires.
    SendChat {
        /// Pending request identifier.
        request: RequestId,
        /// Cancellation handle of the pending request.
        cancel: CancellationToken,
        /// The call to send.
        call: Call,
    },
    /// Show a blocking alert.
    Alert {
        /// Alert text.
        message: String,
    },
    /// The action was refused; nothing changed.
    Rejected(Rejection),
    /// Ask the user to confirm, then resend the event with `confirmed: true`.
    ConfirmationRequired(ConfirmAction),
}

impl Command {
    /// Whether the command is network work for the driver.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Authenticate { .. } | Self::FetchHistory { .. } | Self::SendChat { .. }
        )
    }
}
