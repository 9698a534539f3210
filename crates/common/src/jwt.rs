//! Compact token and key-encoding utilities shared across Feather crates.
//!
//! This module provides the transport-agnostic building blocks used by the
//! session token verifier:
//! - Size limits for DoS prevention
//! - Splitting a compact token into its three segments
//! - base64url segment decoding and header decoding (`alg`, `kid`)
//! - Single-block PEM decoding with label checking
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing in this module verifies a signature; callers MUST verify the
//!   token after looking up the key named by `kid`
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{split_token, decode_header};
//!
//! let segments = split_token(token)?;
//! let header = decode_header(segments.header)?;
//! let kid = header.key_id()?;
//! ```

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE any base64 decoding, JSON
/// parsing, or cryptographic operation.
///
/// Typical session tokens are 600-900 bytes (RS256 signature is 342 base64url
/// characters on its own), so 8KB leaves ample room.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Number of dot-separated segments in a compact signed token.
const SEGMENT_COUNT: usize = 3;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while taking a compact token apart.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The session token is invalid")]
    TokenTooLarge,

    /// Token format is invalid (segment count, base64, or JSON).
    #[error("The session token is invalid")]
    MalformedToken,

    /// Token header is missing the `kid` field, or it is empty.
    #[error("The session token is invalid")]
    MissingKid,
}

/// Errors that can occur while decoding a PEM document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PemError {
    /// No complete `BEGIN`/`END` block was found.
    #[error("no PEM block found")]
    MissingBlock,

    /// The block label is not the one the caller asked for.
    #[error("unexpected PEM block type ({0})")]
    UnexpectedLabel(String),

    /// More than one PEM block was present.
    #[error("expected exactly one PEM block")]
    MultipleBlocks,

    /// The block body is not valid base64.
    #[error("PEM body is not valid base64")]
    InvalidBase64,
}

// =============================================================================
// Types
// =============================================================================

/// The three borrowed segments of a compact token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSegments<'a> {
    /// base64url-encoded header JSON.
    pub header: &'a str,

    /// base64url-encoded claims JSON.
    pub claims: &'a str,

    /// base64url-encoded signature bytes.
    pub signature: &'a str,
}

impl TokenSegments<'_> {
    /// The bytes covered by the signature: `header.claims`.
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.claims)
    }
}

/// Decoded token header.
///
/// Only the fields needed for key selection and algorithm pinning are kept;
/// everything else in the header is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm name (e.g. `RS256`).
    pub alg: String,

    /// Key identifier selecting the verification key.
    #[serde(default)]
    pub kid: Option<String>,
}

impl TokenHeader {
    /// Return the key identifier, rejecting absent and empty values.
    ///
    /// A missing `kid` must never fall back to a default key.
    ///
    /// # Errors
    ///
    /// Returns `JwtValidationError::MissingKid` if the header has no usable `kid`.
    pub fn key_id(&self) -> Result<&str, JwtValidationError> {
        self.kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(JwtValidationError::MissingKid)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Split a compact token into header, claims and signature segments.
///
/// # Security
///
/// Token size is checked BEFORE any splitting (denial-of-service prevention).
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not exactly three segments, or any segment is empty
pub fn split_token(token: &str) -> Result<TokenSegments<'_>, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let segments = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None) => TokenSegments {
            header,
            claims,
            signature,
        },
        _ => {
            tracing::debug!(
                target: "common.jwt",
                parts = token.split('.').count(),
                expected = SEGMENT_COUNT,
                "Token rejected: invalid segment count"
            );
            return Err(JwtValidationError::MalformedToken);
        }
    };

    if segments.header.is_empty() || segments.claims.is_empty() || segments.signature.is_empty()
    {
        tracing::debug!(target: "common.jwt", "Token rejected: empty segment");
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(segments)
}

/// Decode one base64url (unpadded) token segment.
///
/// # Errors
///
/// Returns `JwtValidationError::MalformedToken` if the segment is not valid base64url.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, JwtValidationError> {
    URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode token segment base64");
        JwtValidationError::MalformedToken
    })
}

/// Decode the header segment into a [`TokenHeader`].
///
/// # Errors
///
/// Returns `JwtValidationError::MalformedToken` if the segment is not base64url
/// JSON with a string `alg` (and, when present, a string `kid`).
pub fn decode_header(segment: &str) -> Result<TokenHeader, JwtValidationError> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse token header JSON");
        JwtValidationError::MalformedToken
    })
}

/// Decode a PEM document holding exactly one block with the given label.
///
/// Leading text before the first `-----BEGIN` line is skipped. The body is
/// standard base64 and may be split over any number of lines.
///
/// # Errors
///
/// - `MissingBlock` - No complete block
/// - `UnexpectedLabel` - The block label differs from `expected_label`
/// - `MultipleBlocks` - A second block follows the first
/// - `InvalidBase64` - The body does not decode
///
/// # Example
///
/// ```rust,ignore
/// let der = decode_pem_block(pem, "RSA PUBLIC KEY")?;
/// ```
pub fn decode_pem_block(pem: &str, expected_label: &str) -> Result<Vec<u8>, PemError> {
    let mut lines = pem.lines().map(str::trim).filter(|line| !line.is_empty());

    let label = lines
        .find_map(|line| {
            line.strip_prefix("-----BEGIN ")
                .and_then(|rest| rest.strip_suffix("-----"))
        })
        .ok_or(PemError::MissingBlock)?;

    if label != expected_label {
        return Err(PemError::UnexpectedLabel(label.to_string()));
    }

    let end_marker = format!("-----END {label}-----");
    let mut body = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line == end_marker {
            closed = true;
            break;
        }
        if line.starts_with("-----") {
            return Err(PemError::MissingBlock);
        }
        body.push_str(line);
    }
    if !closed {
        return Err(PemError::MissingBlock);
    }

    if lines.any(|line| line.starts_with("-----BEGIN ")) {
        return Err(PemError::MultipleBlocks);
    }

    STANDARD
        .decode(body.as_bytes())
        .map_err(|_| PemError::InvalidBase64)
}

// =============================================================================
// Tests
// =============================================================================
