//! Feather API client.
//!
//! One [`Client`] owns one HTTP gateway and one public key cache. Clones
//! share both, so keys fetched through any clone are visible to all.

use crate::auth::public_keys::PublicKeyCache;
use crate::auth::verifier::SessionVerifier;
use crate::config::Config;
use crate::errors::FeatherError;
use crate::gateway::HttpGateway;
use crate::resources::{Credentials, Sessions, Users};
use std::sync::Arc;
use tracing::info;

/// Entry point to the Feather API.
#[derive(Clone)]
pub struct Client {
    credentials: Credentials,
    sessions: Sessions,
    users: Users,
    verifier: Arc<SessionVerifier>,
}

impl Client {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `FeatherError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, FeatherError> {
        let gateway = Arc::new(HttpGateway::new(config)?);
        let keys = Arc::new(PublicKeyCache::new(gateway.clone()));
        let verifier = Arc::new(SessionVerifier::new(keys, gateway.clone()));

        info!(
            target: "feather.gateway",
            base_url = %gateway.base_url(),
            "Feather client initialized"
        );

        Ok(Self {
            credentials: Credentials::new(gateway.clone()),
            sessions: Sessions::new(gateway.clone(), verifier.clone()),
            users: Users::new(gateway),
            verifier,
        })
    }

    /// Build a client for the production API with default settings.
    ///
    /// # Errors
    ///
    /// Returns `FeatherError::Configuration` if the HTTP client cannot be built.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, FeatherError> {
        Self::new(&Config::new(api_key))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    /// Session token verifier shared by this client and its clones.
    pub fn verifier(&self) -> &Arc<SessionVerifier> {
        &self.verifier
    }
}
