//! Credentials resource.

use crate::errors::FeatherError;
use crate::gateway::HttpGateway;
use crate::models::Credential;
use reqwest::Method;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Parameters for `POST /credentials`.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialsCreateParams {
    /// Credential type (e.g. `email`, `username|password`).
    #[serde(rename = "type")]
    pub credential_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Redacted in Debug output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for CredentialsCreateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsCreateParams")
            .field("credential_type", &self.credential_type)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Parameters for `POST /credentials/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialsUpdateParams {
    /// Code delivered out of band for `requires_one_time_code` credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_code: Option<String>,
}

/// Client for the credentials resource.
#[derive(Clone)]
pub struct Credentials {
    gateway: Arc<HttpGateway>,
}

impl Credentials {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Create a credential.
    #[instrument(skip_all, fields(credential_type = %params.credential_type))]
    pub async fn create(
        &self,
        params: &CredentialsCreateParams,
    ) -> Result<Credential, FeatherError> {
        self.gateway
            .send_request(Method::POST, &["credentials"], Some(params), None)
            .await
    }

    /// Update a credential, typically to supply a one-time code.
    #[instrument(skip_all, fields(credential_id = %id))]
    pub async fn update(
        &self,
        id: &str,
        params: &CredentialsUpdateParams,
    ) -> Result<Credential, FeatherError> {
        self.gateway
            .send_request(Method::POST, &["credentials", id], Some(params), None)
            .await
    }
}
