//! Feather API resource clients.
//!
//! Thin request/response mappings over [`HttpGateway`](crate::gateway::HttpGateway).
//! Parameters are form-encoded for writes and query-encoded for lists.

pub mod credentials;
pub mod sessions;
pub mod users;

pub use credentials::{Credentials, CredentialsCreateParams, CredentialsUpdateParams};
pub use sessions::{Sessions, SessionsCreateParams, SessionsListParams, SessionsUpgradeParams};
pub use users::{Users, UsersListParams, UsersUpdateParams};

use serde::Serialize;

/// Pagination parameters shared by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    /// Maximum number of objects to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Cursor: return objects after this identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,

    /// Cursor: return objects before this identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_before: Option<String>,
}
