//! Feather API objects.
//!
//! Wire types for the objects the Feather API returns. Timestamps are
//! RFC 3339 strings on the wire and `chrono::DateTime<Utc>` here. Bearer
//! tokens are redacted in Debug output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Sessions
// ============================================================================

/// Session status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The session is currently active.
    Active,

    /// The session has expired.
    Expired,

    /// The session has been revoked.
    Revoked,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Expired => "expired",
            SessionStatus::Revoked => "revoked",
        }
    }
}

/// Session type.
///
/// Open set: any non-empty string the API issues is carried through. The two
/// values the API documents are available as constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionType(String);

impl SessionType {
    /// The session user has not provided a valid credential.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// The session user has provided a valid credential.
    pub const AUTHENTICATED: &'static str = "authenticated";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn anonymous() -> Self {
        Self::new(Self::ANONYMOUS)
    }

    pub fn authenticated() -> Self {
        Self::new(Self::AUTHENTICATED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the session user presented a valid credential.
    pub fn is_authenticated(&self) -> bool {
        self.0 == Self::AUTHENTICATED
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The Feather session object.
///
/// Only built by the session verifier from validated token claims, or
/// decoded from an API response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (`SES_...`).
    pub id: String,

    /// Always `"session"`.
    #[serde(default = "session_object")]
    pub object: String,

    /// Session type.
    #[serde(rename = "type")]
    pub session_type: SessionType,

    /// Session status.
    pub status: SessionStatus,

    /// The session token - redacted in Debug output.
    #[serde(default)]
    pub token: Option<String>,

    /// Owning user (`USR_...`).
    pub user_id: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was revoked, if it was.
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

pub(crate) fn session_object() -> String {
    "session".to_string()
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("object", &self.object)
            .field("session_type", &self.session_type)
            .field("status", &self.status)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("revoked_at", &self.revoked_at)
            .finish()
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credential status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// The credential checked out.
    Valid,

    /// The credential did not match.
    Invalid,

    /// A one-time code was sent and must be supplied to finish.
    RequiresOneTimeCode,
}

/// The Feather credential object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential identifier (`CRD_...`).
    pub id: String,

    /// Always `"credential"`.
    #[serde(default = "credential_object")]
    pub object: String,

    /// When the credential was created.
    pub created_at: DateTime<Utc>,

    /// When the credential stops being usable.
    pub expires_at: DateTime<Utc>,

    /// Verification status.
    pub status: CredentialStatus,

    /// Credential token used to create or upgrade a session - redacted in Debug output.
    #[serde(default)]
    pub token: Option<String>,

    /// Credential type (e.g. `email`, `username|password`).
    #[serde(rename = "type")]
    pub credential_type: String,
}

fn credential_object() -> String {
    "credential".to_string()
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("object", &self.object)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("status", &self.status)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("credential_type", &self.credential_type)
            .finish()
    }
}

// ============================================================================
// Users
// ============================================================================

/// The Feather user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier (`USR_...`).
    pub id: String,

    /// Always `"user"`.
    #[serde(default = "user_object")]
    pub object: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    /// Free-form string metadata owned by the project.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn user_object() -> String {
    "user".to_string()
}

// ============================================================================
// Lists
// ============================================================================

/// A page of objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List<T> {
    /// Always `"list"`.
    #[serde(default = "list_object")]
    pub object: String,

    /// Path the list was fetched from.
    pub url: String,

    /// Whether more objects follow this page.
    pub has_more: bool,

    /// Total number of objects across all pages.
    pub total_count: u32,

    /// Objects on this page.
    pub data: Vec<T>,
}

fn list_object() -> String {
    "list".to_string()
}

/// A page of sessions.
pub type SessionList = List<Session>;

/// A page of users.
pub type UserList = List<User>;
