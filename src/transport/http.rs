//! `reqwest`-backed transport.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;

use super::{Endpoint, Transport, TransportError, TransportFuture};

/// HTTP transport talking JSON to the assistant API.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from the client configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = Self::build_client(config)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL every endpoint path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an HTTP client with JSON headers and cross-origin settings.
    fn build_client(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // The client may be served from another origin than the API.
        if let Some(origin) = &config.page_origin {
            let value = HeaderValue::from_str(origin)
                .map_err(|e| ClientError::HttpClient(format!("invalid origin header: {e}")))?;
            headers.insert(ORIGIN, value);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))
    }

    fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn execute(
        request: reqwest::RequestBuilder,
        endpoint: &'static str,
    ) -> Result<Value, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            debug!(endpoint, status = status.as_u16(), "request rejected");
            return Err(TransportError::ServerRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_body(endpoint, &body))
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Value>,
        timeout: Duration,
    ) -> TransportFuture<'_, Result<Value, TransportError>> {
        Box::pin(async move {
            let name = endpoint.name();
            let mut request = self
                .client
                .request(endpoint.method(), self.url_for(&endpoint));
            if let Some(body) = &payload {
                request = request.json(body);
            }

            debug!(endpoint = name, timeout_ms = timeout.as_millis(), "sending request");

            // Dropping the inner future on elapse aborts the socket.
            match tokio::time::timeout(timeout, Self::execute(request, name)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(endpoint = name, "request timed out");
                    Err(TransportError::Timeout(timeout))
                }
            }
        })
    }
}

/// Decode a success body, mapping empty or non-JSON bodies to `Null`.
fn parse_body(endpoint: &str, body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        warn!(endpoint, "success body is not JSON: {e}");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use serde_json::{Value, json};

    use super::*;
    use crate::test_support::spawn_server;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(&ClientConfig::new().with_api_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("chat", ""), Value::Null);
        assert_eq!(parse_body("chat", "not json"), Value::Null);
        assert_eq!(parse_body("chat", r#"{"a":1}"#), json!({"a": 1}));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let transport = transport("http://127.0.0.1:9/");
        assert_eq!(transport.base_url(), "http://127.0.0.1:9");
        assert_eq!(transport.url_for(&Endpoint::Chat), "http://127.0.0.1:9/chat");
    }

    #[tokio::test]
    async fn test_post_sends_json_and_returns_body() {
        let router = Router::new().route(
            "/chat",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "response": format!("echo: {}", body["question"].as_str().unwrap_or_default()),
                    "content_type": content_type,
                }))
            }),
        );
        let base = spawn_server(router).await;

        let reply = transport(&base)
            .send(
                Endpoint::Chat,
                Some(json!({"question": "2+2?"})),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(reply["response"], "echo: 2+2?");
        assert!(reply["content_type"].as_str().unwrap().starts_with("application/json"));
    }

    #[tokio::test]
    async fn test_get_history_for_encoded_user() {
        let router = Router::new().route(
            "/history/{user_id}",
            get(|Path(user_id): Path<String>| async move {
                Json(json!([{ "message": user_id, "role": "user" }]))
            }),
        );
        let base = spawn_server(router).await;

        let reply = transport(&base)
            .send(
                Endpoint::HistoryFor("ann marie".to_string()),
                None,
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(reply[0]["message"], "ann marie");
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_rejected() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"response": "overloaded"})),
                )
            }),
        );
        let base = spawn_server(router).await;

        let err = transport(&base)
            .send(Endpoint::Chat, Some(json!({})), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.detail().as_deref(), Some("overloaded"));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"response": "too late"}))
            }),
        );
        let base = spawn_server(router).await;

        let timeout = Duration::from_millis(150);
        let started = std::time::Instant::now();
        let err = transport(&base)
            .send(Endpoint::Chat, Some(json!({})), timeout)
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::Timeout(timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(&format!("http://{addr}"))
            .send(Endpoint::Auth, Some(json!({})), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_origin_header_is_sent() {
        let router = Router::new().route(
            "/auth",
            post(|headers: HeaderMap| async move {
                let origin = headers
                    .get("origin")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "origin": origin }))
            }),
        );
        let base = spawn_server(router).await;

        let mut config = ClientConfig::new().with_api_base_url(&base);
        config.page_origin = Some("https://someone.github.io".to_string());
        let reply = HttpTransport::new(&config)
            .unwrap()
            .send(Endpoint::Auth, Some(json!({})), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(reply["origin"], "https://someone.github.io");
    }
}
