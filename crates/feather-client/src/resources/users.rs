//! Users resource.

use crate::errors::FeatherError;
use crate::gateway::HttpGateway;
use crate::models::{User, UserList};
use crate::resources::ListParams;
use reqwest::Method;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Parameters for `GET /users`.
pub type UsersListParams = ListParams;

/// Parameters for `POST /users/{id}`.
///
/// Metadata entries are form-encoded one field per key, as `metadata[key]=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersUpdateParams {
    pub email: Option<String>,
    pub username: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Serialize for UsersUpdateParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(email) = &self.email {
            map.serialize_entry("email", email)?;
        }
        if let Some(username) = &self.username {
            map.serialize_entry("username", username)?;
        }
        if let Some(metadata) = &self.metadata {
            for (key, value) in metadata {
                map.serialize_entry(&format!("metadata[{key}]"), value)?;
            }
        }
        map.end()
    }
}

/// Client for the users resource.
#[derive(Clone)]
pub struct Users {
    gateway: Arc<HttpGateway>,
}

impl Users {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// List the project's users.
    #[instrument(skip_all)]
    pub async fn list(&self, params: &UsersListParams) -> Result<UserList, FeatherError> {
        self.gateway
            .send_request(Method::GET, &["users"], Some(params), None)
            .await
    }

    /// Retrieve a user.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn retrieve(&self, id: &str) -> Result<User, FeatherError> {
        self.gateway
            .send_request::<(), _>(Method::GET, &["users", id], None, None)
            .await
    }

    /// Update a user's email, username or metadata.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn update(&self, id: &str, params: &UsersUpdateParams) -> Result<User, FeatherError> {
        self.gateway
            .send_request(Method::POST, &["users", id], Some(params), None)
            .await
    }
}
