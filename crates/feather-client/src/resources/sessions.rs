//! Sessions resource.
//!
//! `validate` verifies tokens locally through the shared
//! [`SessionVerifier`]; every other operation is a plain API call.

use crate::auth::verifier::SessionVerifier;
use crate::errors::FeatherError;
use crate::gateway::HttpGateway;
use crate::models::{Session, SessionList};
use reqwest::Method;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Parameters for `POST /sessions`.
///
/// Without a credential token the API creates an anonymous session.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionsCreateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_token: Option<String>,
}

impl fmt::Debug for SessionsCreateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionsCreateParams")
            .field(
                "credential_token",
                &self.credential_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parameters for `GET /sessions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionsListParams {
    /// Only sessions owned by this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_before: Option<String>,
}

/// Parameters for `POST /sessions/{id}/upgrade`.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionsUpgradeParams {
    pub credential_token: String,
}

impl fmt::Debug for SessionsUpgradeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionsUpgradeParams")
            .field("credential_token", &"[REDACTED]")
            .finish()
    }
}

/// Client for the sessions resource.
#[derive(Clone)]
pub struct Sessions {
    gateway: Arc<HttpGateway>,
    verifier: Arc<SessionVerifier>,
}

impl Sessions {
    pub fn new(gateway: Arc<HttpGateway>, verifier: Arc<SessionVerifier>) -> Self {
        Self { gateway, verifier }
    }

    /// Create a session, anonymous or from a verified credential.
    #[instrument(skip_all)]
    pub async fn create(&self, params: &SessionsCreateParams) -> Result<Session, FeatherError> {
        self.gateway
            .send_request(Method::POST, &["sessions"], Some(params), None)
            .await
    }

    /// List sessions.
    #[instrument(skip_all)]
    pub async fn list(&self, params: &SessionsListParams) -> Result<SessionList, FeatherError> {
        self.gateway
            .send_request(Method::GET, &["sessions"], Some(params), None)
            .await
    }

    /// Retrieve a session.
    #[instrument(skip_all, fields(session_id = %id))]
    pub async fn retrieve(&self, id: &str) -> Result<Session, FeatherError> {
        self.gateway
            .send_request::<(), _>(Method::GET, &["sessions", id], None, None)
            .await
    }

    /// Upgrade an anonymous session with a credential.
    #[instrument(skip_all, fields(session_id = %id))]
    pub async fn upgrade(
        &self,
        id: &str,
        params: &SessionsUpgradeParams,
    ) -> Result<Session, FeatherError> {
        self.gateway
            .send_request(Method::POST, &["sessions", id, "upgrade"], Some(params), None)
            .await
    }

    /// Validate a session token.
    ///
    /// Verified locally when possible; a token past its expiry is confirmed
    /// with the API.
    ///
    /// # Errors
    ///
    /// - `FeatherError::InvalidToken` if the token fails local verification
    /// - the API or transport error if revalidation fails
    pub async fn validate(&self, token: &str) -> Result<Session, FeatherError> {
        self.verifier.validate(token).await
    }

    /// Validate a session token with a deadline on any network calls.
    pub async fn validate_with_deadline(
        &self,
        token: &str,
        deadline: Instant,
    ) -> Result<Session, FeatherError> {
        self.verifier
            .validate_with_deadline(token, Some(deadline))
            .await
    }
}
