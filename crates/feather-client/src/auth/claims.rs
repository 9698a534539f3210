//! Session token claims.
//!
//! [`TokenClaims`] is the claims segment as it appears on the wire, with
//! every claim optional. [`ClaimValidator`] turns it into a fully populated
//! [`SessionDraft`] or rejects it.
//!
//! Expiry is not a rejection: a token that passes every other check but is
//! past `exp` comes back as [`ClaimsOutcome::Expired`] so the caller can ask
//! the API whether the session is still good.

use crate::auth::TokenRejection;
use crate::models::SessionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::debug;

/// Issuer of every Feather session token.
pub const ISSUER: &str = "feather.id";

/// Prefix of user identifiers (`sub`).
pub const USER_ID_PREFIX: &str = "USR_";

/// Prefix of project identifiers (`aud`).
pub const PROJECT_ID_PREFIX: &str = "PRJ_";

/// Prefix of session identifiers (`ses`).
pub const SESSION_ID_PREFIX: &str = "SES_";

/// Decoded claims segment of a session token.
///
/// A claim of the wrong JSON type decodes as absent, so the validator can
/// name it. Subject is redacted in Debug output.
#[derive(Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "iss", default, deserialize_with = "string_claim")]
    pub issuer: Option<String>,

    /// User identifier.
    #[serde(rename = "sub", default, deserialize_with = "string_claim")]
    pub subject: Option<String>,

    /// Project identifier.
    #[serde(rename = "aud", default, deserialize_with = "string_claim")]
    pub audience: Option<String>,

    #[serde(rename = "ses", default, deserialize_with = "string_claim")]
    pub session_id: Option<String>,

    #[serde(rename = "typ", default, deserialize_with = "string_claim")]
    pub session_type: Option<String>,

    /// Creation time, epoch seconds.
    #[serde(rename = "cat", default, deserialize_with = "numeric_claim")]
    pub created_at: Option<f64>,

    /// Expiry time, epoch seconds.
    #[serde(rename = "exp", default, deserialize_with = "numeric_claim")]
    pub expires_at: Option<f64>,
}

fn string_claim<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn numeric_claim<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_f64))
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject.as_ref().map(|_| "[REDACTED]"))
            .field("audience", &self.audience)
            .field("session_id", &self.session_id)
            .field("session_type", &self.session_type)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Claims that passed every structural check.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub session_id: String,
    pub session_type: SessionType,
    pub user_id: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for SessionDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDraft")
            .field("session_id", &self.session_id)
            .field("session_type", &self.session_type)
            .field("user_id", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of claim validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsOutcome {
    /// Token is within its validity window.
    Current(SessionDraft),

    /// Token is valid in every respect except that `exp` has passed.
    Expired(SessionDraft),
}

impl ClaimsOutcome {
    pub fn draft(&self) -> &SessionDraft {
        match self {
            ClaimsOutcome::Current(draft) | ClaimsOutcome::Expired(draft) => draft,
        }
    }

    pub fn into_draft(self) -> SessionDraft {
        match self {
            ClaimsOutcome::Current(draft) | ClaimsOutcome::Expired(draft) => draft,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ClaimsOutcome::Expired(_))
    }
}

/// Checks decoded claims in a fixed order, stopping at the first failure.
///
/// 1. `iss` is `feather.id`
/// 2. `sub` starts with `USR_`
/// 3. `aud` starts with `PRJ_`
/// 4. `ses` starts with `SES_`
/// 5. `typ` is a non-empty string
/// 6. `cat` is a number
/// 7. `exp` is a number
///
/// Only then is expiry evaluated: expired when `now >= exp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimValidator;

impl ClaimValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate against the current time.
    ///
    /// # Errors
    ///
    /// Returns `TokenRejection::InvalidClaim` naming the first failing claim.
    pub fn validate(&self, claims: &TokenClaims) -> Result<ClaimsOutcome, TokenRejection> {
        self.validate_at(claims, Utc::now())
    }

    /// Validate against an explicit current time (for testing).
    ///
    /// # Errors
    ///
    /// Returns `TokenRejection::InvalidClaim` naming the first failing claim.
    pub fn validate_at(
        &self,
        claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<ClaimsOutcome, TokenRejection> {
        if claims.issuer.as_deref() != Some(ISSUER) {
            return Err(reject("iss"));
        }
        let user_id = prefixed(claims.subject.as_deref(), USER_ID_PREFIX, "sub")?;
        let project_id = prefixed(claims.audience.as_deref(), PROJECT_ID_PREFIX, "aud")?;
        let session_id = prefixed(claims.session_id.as_deref(), SESSION_ID_PREFIX, "ses")?;
        let session_type = claims
            .session_type
            .as_deref()
            .filter(|typ| !typ.is_empty())
            .ok_or_else(|| reject("typ"))?;
        let created_at = timestamp(claims.created_at, "cat")?;
        let expires_at = timestamp(claims.expires_at, "exp")?;

        let draft = SessionDraft {
            session_id: session_id.to_string(),
            session_type: SessionType::new(session_type),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            created_at,
            expires_at,
        };

        if now >= expires_at {
            debug!(
                target: "feather.auth.claims",
                session_id = %draft.session_id,
                expires_at = %expires_at,
                "Session token expired locally"
            );
            return Ok(ClaimsOutcome::Expired(draft));
        }

        Ok(ClaimsOutcome::Current(draft))
    }
}

fn reject(claim: &'static str) -> TokenRejection {
    debug!(target: "feather.auth.claims", claim = claim, "Token rejected: invalid claim");
    TokenRejection::InvalidClaim(claim)
}

fn prefixed<'a>(
    value: Option<&'a str>,
    prefix: &str,
    claim: &'static str,
) -> Result<&'a str, TokenRejection> {
    value
        .filter(|v| v.starts_with(prefix))
        .ok_or_else(|| reject(claim))
}

/// Convert epoch seconds to a timestamp, dropping any fractional part.
#[allow(clippy::cast_possible_truncation)]
fn timestamp(value: Option<f64>, claim: &'static str) -> Result<DateTime<Utc>, TokenRejection> {
    value
        .filter(|secs| secs.is_finite())
        .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0))
        .ok_or_else(|| reject(claim))
}
