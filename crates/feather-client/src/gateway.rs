//! HTTP gateway to the Feather API.
//!
//! Two narrow seams sit in front of the transport so the session verifier
//! can be tested without a network:
//! - [`KeyAuthority`] fetches the PEM public key for a key identifier
//! - [`Gateway`] asks the API to confirm a locally expired session
//!
//! [`HttpGateway`] implements both over reqwest and also carries the generic
//! [`HttpGateway::send_request`] used by the resource clients.
//!
//! # Security
//!
//! - The API key travels as the HTTP basic-auth username, never in the URL
//! - Path segments are percent-encoded, so identifiers cannot alter the route
//! - Every request is bounded by the configured timeout or the caller's deadline

use crate::config::Config;
use crate::errors::{ApiError, FeatherError};
use crate::models::Session;
use crate::observability::metrics;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Connect timeout for API requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Message used when a caller's deadline has already passed.
const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Public key object returned by `GET /publicKeys/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicKeyResponse {
    /// Key identifier, matching the token header `kid`.
    pub id: String,

    /// Always `"publicKey"`.
    #[serde(default)]
    pub object: String,

    /// PEM-encoded RSA public key.
    pub pem: String,
}

/// Source of verification keys.
#[async_trait]
pub trait KeyAuthority: Send + Sync {
    /// Fetch the PEM public key registered under `key_id`.
    async fn fetch_public_key(
        &self,
        key_id: &str,
        deadline: Option<Instant>,
    ) -> Result<PublicKeyResponse, FeatherError>;
}

/// Authority that can confirm a session past its local expiry.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ask the API for the current state of `session_id`, presenting `session_token`.
    async fn validate_session(
        &self,
        session_id: &str,
        session_token: &str,
        deadline: Option<Instant>,
    ) -> Result<Session, FeatherError>;
}

/// Form body for `POST /sessions/{id}/validate`.
#[derive(Serialize)]
struct ValidateSessionForm<'a> {
    session_token: &'a str,
}

/// HTTP client for the Feather API.
#[derive(Clone)]
pub struct HttpGateway {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL every endpoint is appended to (e.g. `https://api.feather.id:443/v1`).
    base_url: Url,

    /// Project API key.
    api_key: SecretString,

    /// Upper bound on a single request.
    request_timeout: Duration,
}

impl HttpGateway {
    /// Create a new gateway from client configuration.
    ///
    /// # Errors
    ///
    /// Returns `FeatherError::Configuration` if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, FeatherError> {
        config
            .validate()
            .map_err(|e| FeatherError::Configuration(e.to_string()))?;

        let base_url = Url::parse(&config.base_url()).map_err(|e| {
            error!(target: "feather.gateway", error = %e, "Invalid API base URL");
            FeatherError::Configuration(format!("invalid API base URL: {e}"))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                error!(target: "feather.gateway", error = %e, "Failed to build HTTP client");
                FeatherError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for an endpoint, percent-encoding each path segment.
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, FeatherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FeatherError::Configuration("API base URL cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Timeout for the next request: the configured bound, shortened by the
    /// caller's deadline.
    fn timeout_for(&self, deadline: Option<Instant>) -> Result<Duration, FeatherError> {
        let Some(deadline) = deadline else {
            return Ok(self.request_timeout);
        };

        match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) if !remaining.is_zero() => Ok(remaining.min(self.request_timeout)),
            _ => {
                debug!(target: "feather.gateway", "Request not sent: deadline already passed");
                Err(FeatherError::Transport(DEADLINE_EXCEEDED.to_string()))
            }
        }
    }

    /// Send a request and decode the JSON response.
    ///
    /// `params` are query-encoded for GET and form-encoded otherwise.
    ///
    /// # Errors
    ///
    /// - `FeatherError::Api` if the API answered non-2xx with an error envelope
    /// - `FeatherError::Transport` for connectivity failures, timeouts, passed
    ///   deadlines, and bodies that cannot be decoded
    pub async fn send_request<P, T>(
        &self,
        method: Method,
        segments: &[&str],
        params: Option<&P>,
        deadline: Option<Instant>,
    ) -> Result<T, FeatherError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let timeout = self.timeout_for(deadline)?;
        let url = self.endpoint_url(segments)?;
        let metric_path = format!("/{}", segments.join("/"));

        let mut request = self
            .client
            .request(method.clone(), url)
            .basic_auth(self.api_key.expose_secret(), Some(""))
            .timeout(timeout);

        if let Some(params) = params {
            request = if method == Method::GET {
                request.query(params)
            } else {
                request.form(params)
            };
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_gateway_request(
                    method.as_str(),
                    &metric_path,
                    None,
                    start.elapsed(),
                );
                warn!(target: "feather.gateway", error = %e, method = %method, "Feather API request failed");
                return Err(if e.is_timeout() {
                    FeatherError::Transport(DEADLINE_EXCEEDED.to_string())
                } else {
                    FeatherError::Transport(format!("request failed: {e}"))
                });
            }
        };

        let status = response.status();
        metrics::record_gateway_request(
            method.as_str(),
            &metric_path,
            Some(status.as_u16()),
            start.elapsed(),
        );

        let body = response.bytes().await.map_err(|e| {
            warn!(target: "feather.gateway", error = %e, "Failed to read Feather API response body");
            FeatherError::Transport(format!("failed to read response body: {e}"))
        })?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                warn!(target: "feather.gateway", error = %e, "Failed to decode Feather API response");
                FeatherError::Transport(format!("failed to decode response body: {e}"))
            });
        }

        match serde_json::from_slice::<ApiError>(&body) {
            Ok(error) => {
                warn!(
                    target: "feather.gateway",
                    status = status.as_u16(),
                    error_type = %error.error_type,
                    code = %error.code,
                    "Feather API returned error"
                );
                Err(FeatherError::Api {
                    status: status.as_u16(),
                    error,
                })
            }
            Err(_) => {
                warn!(target: "feather.gateway", status = %status, "Unexpected Feather API response");
                Err(FeatherError::Transport(format!(
                    "unexpected response status {status}"
                )))
            }
        }
    }
}

#[async_trait]
impl KeyAuthority for HttpGateway {
    #[instrument(skip_all, fields(key_id = %key_id))]
    async fn fetch_public_key(
        &self,
        key_id: &str,
        deadline: Option<Instant>,
    ) -> Result<PublicKeyResponse, FeatherError> {
        self.send_request::<(), _>(Method::GET, &["publicKeys", key_id], None, deadline)
            .await
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip_all, fields(session_id = %session_id))]
    async fn validate_session(
        &self,
        session_id: &str,
        session_token: &str,
        deadline: Option<Instant>,
    ) -> Result<Session, FeatherError> {
        let form = ValidateSessionForm { session_token };
        self.send_request(
            Method::POST,
            &["sessions", session_id, "validate"],
            Some(&form),
            deadline,
        )
        .await
    }
}
