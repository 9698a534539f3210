//! Feather client error types.
//!
//! Every failure inside token parsing, key lookup and claim validation
//! collapses to [`FeatherError::InvalidToken`] before it leaves the crate.
//! The caller sees the same error whichever check failed; the actual reason
//! is logged server-side at debug level. Only errors reported by the Feather
//! API itself are forwarded as [`FeatherError::Api`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for request validation failures.
pub const ERROR_TYPE_VALIDATION: &str = "validation_error";

/// Error code for a token that failed local verification.
pub const ERROR_CODE_SESSION_TOKEN_INVALID: &str = "session_token_invalid";

/// Error code the API uses for a session token past its expiry.
pub const ERROR_CODE_SESSION_TOKEN_EXPIRED: &str = "session_token_expired";

/// Error envelope returned by the Feather API.
///
/// Wire format: `{ "object": "error", "type": ..., "code": ..., "message": ... }`.
/// Displays as its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Always `"error"`.
    #[serde(default = "error_object")]
    pub object: String,

    /// Broad error category (e.g. `validation_error`).
    #[serde(rename = "type")]
    pub error_type: String,

    /// Specific error code (e.g. `session_token_expired`).
    pub code: String,

    /// Human-readable description.
    pub message: String,
}

fn error_object() -> String {
    "error".to_string()
}

/// Feather client error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatherError {
    /// The session token failed local verification.
    #[error("The session token is invalid")]
    InvalidToken,

    /// The Feather API answered with an error envelope.
    #[error("{error}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Decoded error envelope.
        error: ApiError,
    },

    /// The request could not be completed or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The client could not be set up.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FeatherError {
    /// Error type as reported to callers, when one applies.
    pub fn error_type(&self) -> Option<&str> {
        match self {
            FeatherError::InvalidToken => Some(ERROR_TYPE_VALIDATION),
            FeatherError::Api { error, .. } => Some(&error.error_type),
            FeatherError::Transport(_) | FeatherError::Configuration(_) => None,
        }
    }

    /// Error code as reported to callers, when one applies.
    pub fn code(&self) -> Option<&str> {
        match self {
            FeatherError::InvalidToken => Some(ERROR_CODE_SESSION_TOKEN_INVALID),
            FeatherError::Api { error, .. } => Some(&error.code),
            FeatherError::Transport(_) | FeatherError::Configuration(_) => None,
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FeatherError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
