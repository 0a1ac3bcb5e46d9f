//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use serde_json::Value;

use crate::transport::{Endpoint, Transport, TransportError, TransportFuture};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A call observed by [`ScriptedTransport`].
#[derive(Clone, Debug)]
pub struct SeenCall {
    pub endpoint: Endpoint,
    pub payload: Option<Value>,
    pub timeout: Duration,
}

/// Transport answering from a queue of canned outcomes.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, TransportError>>>,
    seen: Mutex<Vec<SeenCall>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<Value, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Value>,
        timeout: Duration,
    ) -> TransportFuture<'_, Result<Value, TransportError>> {
        self.seen.lock().unwrap().push(SeenCall {
            endpoint,
            payload,
            timeout,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no scripted reply".to_string())));
        Box::pin(async move { reply })
    }
}
