//! Async driver around the [`Orchestrator`].
//!
//! `ChatClient` runs the network commands the orchestrator emits on spawned
//! tokio tasks and feeds their completions back as events. Commands meant
//! for the user (alerts, rejections, confirmation prompts) are returned to
//! the caller.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::mpsc;
use tracing::debug;

use crate::chat::{Command, ConversationLog, Event, Orchestrator};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::session::Session;
use crate::transport::{HttpTransport, Transport, TransportError};

/// Chat client driving the orchestrator against a [`Transport`].
pub struct ChatClient {
    orchestrator: Orchestrator,
    transport: Arc<dyn Transport>,
    completions_tx: mpsc::UnboundedSender<Event>,
    completions_rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl ChatClient {
    /// Create a client talking HTTP to `config.api_base_url`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over an arbitrary transport.
    ///
    /// # Errors
    /// Returns an error if the sanitizer cannot be built.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> ClientResult<Self> {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Ok(Self {
            orchestrator: Orchestrator::new(config)?,
            transport,
            completions_tx,
            completions_rx,
            in_flight: 0,
        })
    }

    /// The underlying state machine.
    #[must_use]
    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        self.orchestrator.session()
    }

    /// Conversation log.
    #[must_use]
    pub const fn log(&self) -> &ConversationLog {
        self.orchestrator.log()
    }

    /// Number of network calls whose completion has not been processed.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply `event`, start any network work and return the user-facing
    /// commands.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut shown = Vec::new();
        for command in self.orchestrator.dispatch(event) {
            if command.is_network() {
                self.spawn(command);
            } else {
                shown.push(command);
            }
        }
        shown
    }

    /// Wait for the next network completion and apply it.
    ///
    /// Returns `None` when nothing is in flight. Cancel-safe: dropping the
    /// future before it resolves loses no completion.
    pub async fn next_completion(&mut self) -> Option<Vec<Command>> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.completions_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.handle(event))
    }

    /// Process completions until no network call is in flight.
    pub async fn settle(&mut self) -> Vec<Command> {
        let mut shown = Vec::new();
        while let Some(commands) = self.next_completion().await {
            shown.extend(commands);
        }
        shown
    }

    /// Sign in and wait for the sign-in and history calls to finish.
    pub async fn sign_in(&mut self, identity: &str, credential: SecretString) -> Vec<Command> {
        let mut shown = self.handle(Event::SignInRequested {
            identity: identity.to_string(),
            credential,
        });
        shown.extend(self.settle().await);
        shown
    }

    /// Submit `text` without waiting for the reply.
    pub fn submit(&mut self, text: &str) -> Vec<Command> {
        self.handle(Event::SubmitRequested {
            text: text.to_string(),
        })
    }

    /// Submit `text` and wait until the reply (or failure notice) is logged.
    pub async fn ask(&mut self, text: &str) -> Vec<Command> {
        let mut shown = self.submit(text);
        shown.extend(self.settle().await);
        shown
    }

    /// End the session without asking for confirmation.
    pub fn sign_out(&mut self) -> Vec<Command> {
        self.handle(Event::SignOutRequested { confirmed: true })
    }

    fn spawn(&mut self, command: Command) {
        let transport = Arc::clone(&self.transport);
        let completions = self.completions_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let event = match command {
                Command::Authenticate { epoch, call } => Event::SignInResolved {
                    epoch,
                    outcome: call.send(transport.as_ref()).await,
                },
                Command::FetchHistory { epoch, call } => Event::HistoryResolved {
                    epoch,
                    outcome: call.send(transport.as_ref()).await,
                },
                Command::SendChat {
                    request,
                    cancel,
                    call,
                } => {
                    let outcome = tokio::select! {
                        biased;
                        () = cancel.cancelled() => Err(TransportError::Cancelled),
                        outcome = call.send(transport.as_ref()) => outcome,
                    };
                    match outcome {
                        Err(TransportError::Timeout(_)) => Event::Timeout { request },
                        outcome => Event::ResponseReceived { request, outcome },
                    }
                }
                Command::Alert { .. }
                | Command::Rejected(_)
                | Command::ConfirmationRequired(_) => return,
            };

            if completions.send(event).is_err() {
                debug!("client dropped, discarding completion");
            }
        });
    }
}
