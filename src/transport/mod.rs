//! Transport client for the assistant API.
//!
//! Every outbound call goes through [`Transport::send`], which applies a
//! bounded wait and translates failures into [`TransportError`]. Dropping the
//! returned future aborts the underlying HTTP request.

pub mod error;
pub mod http;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTransport;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

/// Boxed future type for transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over the HTTP layer.
pub trait Transport: Send + Sync {
    /// Send `payload` to `endpoint` and wait at most `timeout` for a reply.
    ///
    /// Resolves to the decoded JSON body on a 2xx status (`Value::Null` for
    /// an empty or non-JSON body).
    ///
    /// # Errors
    /// Returns [`TransportError::Timeout`] when the wait elapses,
    /// [`TransportError::ServerRejected`] on a non-2xx status and
    /// [`TransportError::Unreachable`] when no response arrives at all.
    fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Value>,
        timeout: Duration,
    ) -> TransportFuture<'_, Result<Value, TransportError>>;
}

/// API endpoints used by the client.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Endpoint {
    /// `POST /auth`.
    Auth,
    /// `POST /chat`.
    Chat,
    /// `POST /history` (credential-bearing).
    History,
    /// `GET /history/{user_id}`.
    HistoryFor(String),
}

impl Endpoint {
    /// HTTP method of the endpoint.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::HistoryFor(_) => Method::GET,
            Self::Auth | Self::Chat | Self::History => Method::POST,
        }
    }

    /// Path relative to the API base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Auth => "/auth".to_string(),
            Self::Chat => "/chat".to_string(),
            Self::History => "/history".to_string(),
            Self::HistoryFor(user_id) => format!("/history/{}", urlencoding::encode(user_id)),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Chat => "chat",
            Self::History | Self::HistoryFor(_) => "history",
        }
    }
}

/// A fully described outbound call, ready for [`Transport::send`].
#[derive(Clone)]
pub struct Call {
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// JSON body, if any.
    pub payload: Option<Value>,
    /// Bounded wait.
    pub timeout: Duration,
}

impl Call {
    /// Describe a call.
    #[must_use]
    pub const fn new(endpoint: Endpoint, payload: Option<Value>, timeout: Duration) -> Self {
        Self {
            endpoint,
            payload,
            timeout,
        }
    }

    /// Execute the call on `transport`.
    ///
    /// # Errors
    /// See [`Transport::send`].
    pub async fn send(self, transport: &dyn Transport) -> Result<Value, TransportError> {
        transport
            .send(self.endpoint, self.payload, self.timeout)
            .await
    }
}

// Payloads carry the password; keep them out of debug output.
impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}
