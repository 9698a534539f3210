//! Session token parsing and signature verification.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted, checked before any key lookup
//! - A missing or empty `kid` is rejected; there is no default key
//! - Claims are decoded only after the signature verifies
//! - All failures collapse to one generic rejection

use crate::auth::claims::TokenClaims;
use crate::auth::public_keys::PublicKeyCache;
use crate::auth::{TokenRejection, SUPPORTED_ALGORITHM};
use common::jwt::{decode_header, decode_segment, split_token, TokenSegments};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Parses compact session tokens and verifies their signatures.
pub struct TokenCodec {
    keys: Arc<PublicKeyCache>,
}

impl TokenCodec {
    pub fn new(keys: Arc<PublicKeyCache>) -> Self {
        Self { keys }
    }

    /// Key cache used to resolve `kid`.
    pub fn keys(&self) -> &Arc<PublicKeyCache> {
        &self.keys
    }

    /// Parse `token`, verify its signature and decode its claims.
    ///
    /// Claims are returned as decoded; nothing about them is judged here.
    ///
    /// # Security Checks
    ///
    /// 1. Size and segment count
    /// 2. Header decodes and `alg` is RS256
    /// 3. Header carries a non-empty `kid`
    /// 4. Key for `kid` is available
    /// 5. Signature over `header.claims` verifies
    ///
    /// # Errors
    ///
    /// Returns a `TokenRejection` for the first check that fails.
    #[instrument(skip_all)]
    pub async fn parse_and_verify(
        &self,
        token: &str,
        deadline: Option<Instant>,
    ) -> Result<TokenClaims, TokenRejection> {
        let segments = split_token(token)?;

        let header = decode_header(segments.header)?;
        if header.alg != SUPPORTED_ALGORITHM {
            debug!(target: "feather.auth.codec", alg = %header.alg, "Token rejected: unsupported algorithm");
            return Err(TokenRejection::UnsupportedAlgorithm);
        }

        let key_id = header.key_id().map_err(|e| {
            debug!(target: "feather.auth.codec", "Token rejected: missing kid");
            TokenRejection::from(e)
        })?;

        let record = self.keys.get_key(key_id, deadline).await.map_err(|e| {
            debug!(target: "feather.auth.codec", kid = %key_id, error = %e, "Token rejected: key unavailable");
            TokenRejection::KeyUnavailable
        })?;

        verify_signature(&segments, record.decoding_key())?;

        decode_claims(segments.claims)
    }
}

/// Check the RS256 signature of `header.claims`.
fn verify_signature(segments: &TokenSegments<'_>, key: &DecodingKey) -> Result<(), TokenRejection> {
    let message = segments.signing_input();
    match jsonwebtoken::crypto::verify(
        segments.signature,
        message.as_bytes(),
        key,
        Algorithm::RS256,
    ) {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!(target: "feather.auth.codec", "Token rejected: signature mismatch");
            Err(TokenRejection::SignatureMismatch)
        }
        Err(e) => {
            debug!(target: "feather.auth.codec", error = %e, "Token rejected: signature unreadable");
            Err(TokenRejection::SignatureMismatch)
        }
    }
}

/// Decode the claims segment.
fn decode_claims(segment: &str) -> Result<TokenClaims, TokenRejection> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(target: "feather.auth.codec", error = %e, "Token rejected: claims are not a JSON object");
        TokenRejection::Malformed
    })
}
