//! Configuration for the chat client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default API origin when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default wait for chat, sign-in and history calls.
///
/// Generous enough to cover a cold start of the assistant service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(35);

/// Environment variable holding an explicit API base URL.
const API_URL_ENV: &str = "STUDYBOT_API_URL";
/// Environment variable holding the origin the client is served from.
const PAGE_ORIGIN_ENV: &str = "STUDYBOT_PAGE_ORIGIN";
/// Environment variable holding the fallback origin for static hosting.
const FALLBACK_URL_ENV: &str = "STUDYBOT_FALLBACK_URL";
/// Environment variable overriding the chat timeout (seconds).
const CHAT_TIMEOUT_ENV: &str = "STUDYBOT_CHAT_TIMEOUT_SECS";
/// Environment variable selecting the history variant (`get` or `post`).
const HISTORY_MODE_ENV: &str = "STUDYBOT_HISTORY_MODE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A value is out of range or unsupported.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How conversation history is fetched after sign-in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// `POST /history` with `{user_id, password}`.
    #[default]
    Post,
    /// `GET /history/{user_id}` without credentials.
    Get,
}

impl HistoryMode {
    /// Parse the mode from its configuration spelling.
    ///
    /// # Errors
    /// Returns an error for anything other than `get` or `post`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "get" => Ok(Self::Get),
            other => Err(ConfigError::Invalid(format!(
                "history mode must be `get` or `post`, got `{other}`"
            ))),
        }
    }
}

/// Chooses the API origin from the origin the client is served from.
///
/// Self-hosted clients talk to their own origin. Clients served from a
/// static-hosting domain cannot, and use the fallback origin instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseUrlPolicy {
    /// Origin used when the page is served from a static host.
    pub fallback_origin: String,
    /// Host suffixes that identify static hosting.
    pub static_hosts: Vec<String>,
}

impl BaseUrlPolicy {
    /// Create a policy with the default static-hosting domains.
    #[must_use]
    pub fn new(fallback_origin: impl Into<String>) -> Self {
        Self {
            fallback_origin: fallback_origin.into(),
            static_hosts: vec!["github.io".to_string()],
        }
    }

    /// Resolve the API base URL for a page origin.
    ///
    /// # Errors
    /// Returns an error if the page origin or fallback origin is not a URL.
    pub fn resolve(&self, page_origin: &str) -> Result<String, ConfigError> {
        let page = Url::parse(page_origin)?;
        let host = page.host_str().unwrap_or_default();
        let is_static = self
            .static_hosts
            .iter()
            .any(|suffix| host == suffix || host.ends_with(&format!(".{suffix}")));

        if is_static {
            let fallback = Url::parse(&self.fallback_origin)?;
            Ok(fallback.as_str().trim_end_matches('/').to_string())
        } else {
            Ok(page.origin().ascii_serialization())
        }
    }
}

/// Configuration for the chat client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the assistant API (no trailing slash required).
    pub api_base_url: String,
    /// Origin the client claims to be served from; sent as `Origin`.
    pub page_origin: Option<String>,
    /// Bounded wait for a chat reply.
    #[serde(with = "duration_serde")]
    pub chat_timeout: Duration,
    /// Bounded wait for the sign-in call.
    #[serde(with = "duration_serde")]
    pub auth_timeout: Duration,
    /// Bounded wait for the history call.
    #[serde(with = "duration_serde")]
    pub history_timeout: Duration,
    /// TCP connect timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// History variant.
    pub history_mode: HistoryMode,
    /// Whether a welcome entry is shown after sign-in.
    pub welcome_message: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_origin: None,
            chat_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_timeout: DEFAULT_REQUEST_TIMEOUT,
            history_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            history_mode: HistoryMode::Post,
            welcome_message: true,
        }
    }
}

impl ClientConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Derive the API base URL from the page URL using `policy`.
    ///
    /// Only the scheme, host and port of `page_origin` are kept for the
    /// `Origin` header.
    ///
    /// # Errors
    /// Returns an error if either origin fails to parse.
    pub fn for_page_origin(
        mut self,
        page_origin: &str,
        policy: &BaseUrlPolicy,
    ) -> Result<Self, ConfigError> {
        self.api_base_url = policy.resolve(page_origin)?;
        self.page_origin = Some(Url::parse(page_origin)?.origin().ascii_serialization());
        Ok(self)
    }

    /// Set the chat timeout.
    #[must_use]
    pub const fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Set the history variant.
    #[must_use]
    pub const fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    /// Enable or disable the welcome entry.
    #[must_use]
    pub const fn with_welcome_message(mut self, enabled: bool) -> Self {
        self.welcome_message = enabled;
        self
    }

    /// Build a config from `STUDYBOT_*` environment variables.
    ///
    /// `STUDYBOT_API_URL` wins over origin-based resolution; otherwise
    /// `STUDYBOT_PAGE_ORIGIN` is resolved against `STUDYBOT_FALLBACK_URL`.
    ///
    /// # Errors
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(api_url) = std::env::var(API_URL_ENV) {
            config.api_base_url = api_url;
        } else if let Ok(origin) = std::env::var(PAGE_ORIGIN_ENV) {
            let fallback = std::env::var(FALLBACK_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
            config = config.for_page_origin(&origin, &BaseUrlPolicy::new(fallback))?;
        }

        if let Ok(secs) = std::env::var(CHAT_TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{CHAT_TIMEOUT_ENV} must be whole seconds"))
            })?;
            config.chat_timeout = Duration::from_secs(secs);
        }

        if let Ok(mode) = std::env::var(HISTORY_MODE_ENV) {
            config.history_mode = HistoryMode::parse(&mode)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.api_base_url)?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "api_base_url `{}` cannot be used as a base",
                self.api_base_url
            )));
        }

        if let Some(origin) = &self.page_origin {
            Url::parse(origin)?;
        }

        for (name, timeout) in [
            ("chat_timeout", self.chat_timeout),
            ("auth_timeout", self.auth_timeout),
            ("history_timeout", self.history_timeout),
            ("connect_timeout", self.connect_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be > 0")));
            }
        }

        Ok(())
    }
}

/// Serde module for Duration serialization as (fractional) seconds.
///
/// Precision is one millisecond.
mod duration_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 || secs > 1.0e12 {
            return Err(D::Error::custom(format!("invalid duration: {secs} s")));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (secs * 1000.0).round() as u64;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.chat_timeout, Duration::from_secs(35));
        assert_eq!(config.history_mode, HistoryMode::Post);
        assert!(config.welcome_message);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_api_base_url("https://api.example.com")
            .with_chat_timeout(Duration::from_secs(5))
            .with_history_mode(HistoryMode::Get)
            .with_welcome_message(false);

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.chat_timeout, Duration::from_secs(5));
        assert_eq!(config.history_mode, HistoryMode::Get);
        assert!(!config.welcome_message);
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_bad_url() {
        let zero = ClientConfig::new().with_chat_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid(_))));

        let bad_url = ClientConfig::new().with_api_base_url("not a url");
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_static_host_uses_fallback_origin() {
        let policy = BaseUrlPolicy::new("https://studybot.example.net/");
        let resolved = policy.resolve("https://someone.github.io/studybot/");
        assert_eq!(resolved.ok().as_deref(), Some("https://studybot.example.net"));
    }

    #[test]
    fn test_self_hosted_uses_own_origin() {
        let policy = BaseUrlPolicy::new("https://studybot.example.net");
        let resolved = policy.resolve("http://localhost:8000/docs/index.html");
        assert_eq!(resolved.ok().as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_for_page_origin_sets_origin_header_value() {
        let policy = BaseUrlPolicy::new("https://studybot.example.net");
        let config = ClientConfig::new()
            .for_page_origin("https://someone.github.io/studybot/index.html?x=1", &policy)
            .unwrap();
        assert_eq!(config.api_base_url, "https://studybot.example.net");
        assert_eq!(config.page_origin.as_deref(), Some("https://someone.github.io"));

        let local = ClientConfig::new()
            .for_page_origin("http://localhost:8080/docs/", &policy)
            .unwrap();
        assert_eq!(local.page_origin.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_history_mode_parse() {
        assert_eq!(HistoryMode::parse(" GET ").ok(), Some(HistoryMode::Get));
        assert_eq!(HistoryMode::parse("post").ok(), Some(HistoryMode::Post));
        assert!(HistoryMode::parse("put").is_err());
    }

    #[test]
    fn test_durations_serialize_as_seconds() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(json["chat_timeout"].as_f64(), Some(35.0));
        assert_eq!(json["history_mode"], "post");
    }

    #[test]
    fn test_sub_second_timeout_survives_round_trip() {
        let config = ClientConfig::new().with_chat_timeout(Duration::from_millis(150));
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.chat_timeout, Duration::from_millis(150));
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_whole_second_durations_deserialize() {
        let mut json = serde_json::to_value(ClientConfig::default()).unwrap();
        json["auth_timeout"] = serde_json::json!(12);
        let config: ClientConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(config.auth_timeout, Duration::from_secs(12));

        json["auth_timeout"] = serde_json::json!(-1);
        assert!(serde_json::from_value::<ClientConfig>(json).is_err());
    }
}
