//! Feather client configuration.
//!
//! Configuration is loaded from environment variables or built in code.
//! The API key is held as a `SecretString` and never appears in Debug output.

use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default API protocol.
pub const DEFAULT_PROTOCOL: &str = "https";

/// Default API host.
pub const DEFAULT_HOST: &str = "api.feather.id";

/// Default API port.
pub const DEFAULT_PORT: u16 = 443;

/// Default API base path.
pub const DEFAULT_BASE_PATH: &str = "/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Maximum per-request timeout in seconds.
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Feather client configuration.
#[derive(Clone)]
pub struct Config {
    /// Project API key, sent as the basic-auth username.
    pub api_key: SecretString,

    /// `http` or `https` (default: "https").
    pub protocol: String,

    /// API host (default: "api.feather.id").
    pub host: String,

    /// API port (default: 443).
    pub port: u16,

    /// Path prefix for every endpoint (default: "/v1").
    pub base_path: String,

    /// Upper bound on any single HTTP request.
    pub request_timeout: Duration,
}

/// Custom Debug implementation that redacts the API key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid protocol configuration: {0}")]
    InvalidProtocol(String),

    #[error("Invalid host configuration: {0}")]
    InvalidHost(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),

    #[error("Invalid request timeout configuration: {0}")]
    InvalidRequestTimeout(String),
}

impl Config {
    /// Build a configuration for the production API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Point the client at a full base URL such as `http://127.0.0.1:4010/v1`.
    ///
    /// Used by tests to aim the client at a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidHost(format!("invalid base URL '{base_url}': {e}")))?;

        self.protocol = url.scheme().to_string();
        self.host = url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidHost(format!("base URL '{base_url}' has no host")))?
            .to_string();
        self.port = url.port_or_known_default().ok_or_else(|| {
            ConfigError::InvalidPort(format!("base URL '{base_url}' has no port"))
        })?;
        self.base_path = url.path().trim_end_matches('/').to_string();
        self.validate()?;
        Ok(self)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("FEATHER_API_KEY")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("FEATHER_API_KEY".to_string()))?;

        let mut config = Self::new(api_key.clone());

        if let Some(protocol) = vars.get("FEATHER_PROTOCOL") {
            config.protocol = protocol.clone();
        }

        if let Some(host) = vars.get("FEATHER_HOST") {
            config.host = host.clone();
        }

        if let Some(value_str) = vars.get("FEATHER_PORT") {
            config.port = value_str.parse().map_err(|e| {
                ConfigError::InvalidPort(format!(
                    "FEATHER_PORT must be a valid port number, got '{}': {}",
                    value_str, e
                ))
            })?;
        }

        if let Some(base_path) = vars.get("FEATHER_BASE_PATH") {
            config.base_path = base_path.clone();
        }

        // Parse request timeout with validation
        if let Some(value_str) = vars.get("FEATHER_REQUEST_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidRequestTimeout(format!(
                    "FEATHER_REQUEST_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;
            config.request_timeout = Duration::from_secs(value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check field values that setters and env loading both accept blindly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(format!(
                "protocol must be 'http' or 'https', got '{}'",
                self.protocol
            )));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidHost("host must not be empty".to_string()));
        }

        let timeout_secs = self.request_timeout.as_secs();
        if timeout_secs == 0 || timeout_secs > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(ConfigError::InvalidRequestTimeout(format!(
                "request timeout must be between 1 and {} seconds, got {}",
                MAX_REQUEST_TIMEOUT_SECONDS, timeout_secs
            )));
        }

        Ok(())
    }

    /// Base URL every endpoint path is appended to.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.base_path
        )
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}
