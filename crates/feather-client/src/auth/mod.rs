//! Session token verification.
//!
//! A presented token moves through these stages:
//!
//! 1. [`codec`] splits it, pins the algorithm, looks up the key named by
//!    `kid` through the [`public_keys`] cache and checks the signature
//! 2. [`claims`] decodes and checks the claims, yielding a current or an
//!    expired [`claims::SessionDraft`]
//! 3. a current draft goes to [`assembler`]; an expired one goes to
//!    [`revalidation`], which asks the API for the authoritative session
//!
//! [`verifier::SessionVerifier`] runs the stages. Every local failure is a
//! [`TokenRejection`] internally and [`FeatherError::InvalidToken`] outside.

pub mod assembler;
pub mod claims;
pub mod codec;
pub mod public_keys;
pub mod revalidation;
pub mod verifier;

use crate::errors::FeatherError;
use common::jwt::JwtValidationError;
use thiserror::Error;

/// The only signing algorithm accepted for session tokens.
pub const SUPPORTED_ALGORITHM: &str = "RS256";

/// Reason a token failed local verification.
///
/// Every variant renders the same message. The specific reason is for
/// debug logging only and never reaches a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("The session token is invalid")]
    Empty,

    #[error("The session token is invalid")]
    Malformed,

    #[error("The session token is invalid")]
    UnsupportedAlgorithm,

    #[error("The session token is invalid")]
    MissingKeyId,

    #[error("The session token is invalid")]
    KeyUnavailable,

    #[error("The session token is invalid")]
    SignatureMismatch,

    /// A claim is absent or does not have the expected shape.
    #[error("The session token is invalid")]
    InvalidClaim(&'static str),
}

impl TokenRejection {
    /// Short reason for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenRejection::Empty => "empty",
            TokenRejection::Malformed => "malformed",
            TokenRejection::UnsupportedAlgorithm => "unsupported_algorithm",
            TokenRejection::MissingKeyId => "missing_kid",
            TokenRejection::KeyUnavailable => "key_unavailable",
            TokenRejection::SignatureMismatch => "signature_mismatch",
            TokenRejection::InvalidClaim(claim) => claim,
        }
    }
}

impl From<JwtValidationError> for TokenRejection {
    fn from(err: JwtValidationError) -> Self {
        match err {
            JwtValidationError::TokenTooLarge | JwtValidationError::MalformedToken => {
                TokenRejection::Malformed
            }
            JwtValidationError::MissingKid => TokenRejection::MissingKeyId,
        }
    }
}

impl From<TokenRejection> for FeatherError {
    fn from(_: TokenRejection) -> Self {
        FeatherError::InvalidToken
    }
}
