//! Public key cache for session token verification.
//!
//! Keys are fetched from the [`KeyAuthority`] on first use of a key
//! identifier and kept for the life of the cache.
//!
//! # Security
//!
//! - A key is cached only after its PEM decodes to exactly one
//!   `RSA PUBLIC KEY` block holding a parseable RSA public key
//! - Failed lookups are never cached
//! - An entry is never overwritten; the first successful insert for an
//!   identifier wins
//!
//! Key identifiers are assumed never to be reassigned to a different key.
//! There is no TTL and no invalidation.

use crate::errors::FeatherError;
use crate::gateway::KeyAuthority;
use crate::observability::metrics;
use common::jwt::{decode_pem_block, PemError};
use jsonwebtoken::DecodingKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// PEM label the API uses for public keys, whatever the DER encoding inside.
pub const PUBLIC_KEY_PEM_LABEL: &str = "RSA PUBLIC KEY";

/// Why a key could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFetchError {
    #[error("key identifier is empty")]
    EmptyKeyId,

    #[error("key authority request failed: {0}")]
    Authority(FeatherError),

    #[error("public key PEM rejected: {0}")]
    Pem(#[from] PemError),

    #[error("public key is not a PKIX or PKCS#1 RSA public key")]
    UnsupportedKey,
}

/// A parsed verification key.
#[derive(Clone)]
pub struct PublicKeyRecord {
    key_id: String,
    key: DecodingKey,
}

impl PublicKeyRecord {
    /// Parse a PEM document into a key record.
    ///
    /// The DER inside the block is tried as PKIX SubjectPublicKeyInfo first
    /// and as PKCS#1 RSAPublicKey second.
    ///
    /// # Errors
    ///
    /// - `KeyFetchError::Pem` if the document is not exactly one block
    ///   labelled `RSA PUBLIC KEY`
    /// - `KeyFetchError::UnsupportedKey` if neither encoding parses
    pub fn from_pem(key_id: &str, pem: &str) -> Result<Self, KeyFetchError> {
        let der = decode_pem_block(pem, PUBLIC_KEY_PEM_LABEL)?;

        let public_key = RsaPublicKey::from_public_key_der(&der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
            .map_err(|_| KeyFetchError::UnsupportedKey)?;

        let modulus = public_key.n().to_bytes_be();
        let exponent = public_key.e().to_bytes_be();

        Ok(Self {
            key_id: key_id.to_string(),
            key: DecodingKey::from_rsa_raw_components(&modulus, &exponent),
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for PublicKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyRecord")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Process-lifetime cache of verification keys, keyed by `kid`.
///
/// Safe to share between concurrent verifications. Two concurrent misses on
/// the same identifier may both fetch; only the first insert is kept.
pub struct PublicKeyCache {
    authority: Arc<dyn KeyAuthority>,
    keys: RwLock<HashMap<String, Arc<PublicKeyRecord>>>,
}

impl PublicKeyCache {
    pub fn new(authority: Arc<dyn KeyAuthority>) -> Self {
        Self {
            authority,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Get the key for `key_id`, fetching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns a `KeyFetchError` if the identifier is empty, the authority
    /// request fails, or the returned PEM is not a usable RSA public key.
    #[instrument(skip(self, deadline), fields(kid = %key_id))]
    pub async fn get_key(
        &self,
        key_id: &str,
        deadline: Option<Instant>,
    ) -> Result<Arc<PublicKeyRecord>, KeyFetchError> {
        if key_id.is_empty() {
            return Err(KeyFetchError::EmptyKeyId);
        }

        if let Some(record) = self.keys.read().await.get(key_id) {
            debug!(target: "feather.auth.keys", kid = %key_id, "Public key cache hit");
            metrics::record_key_cache_lookup(true);
            return Ok(Arc::clone(record));
        }
        metrics::record_key_cache_lookup(false);

        debug!(target: "feather.auth.keys", kid = %key_id, "Public key cache miss, fetching");
        let record = match self.fetch(key_id, deadline).await {
            Ok(record) => {
                metrics::record_key_fetch(true);
                record
            }
            Err(e) => {
                metrics::record_key_fetch(false);
                debug!(target: "feather.auth.keys", kid = %key_id, error = %e, "Public key unavailable");
                return Err(e);
            }
        };

        let mut keys = self.keys.write().await;
        let cached = keys
            .entry(key_id.to_string())
            .or_insert_with(|| {
                info!(target: "feather.auth.keys", kid = %key_id, "Cached public key");
                Arc::new(record)
            });
        Ok(Arc::clone(cached))
    }

    async fn fetch(
        &self,
        key_id: &str,
        deadline: Option<Instant>,
    ) -> Result<PublicKeyRecord, KeyFetchError> {
        let response = self
            .authority
            .fetch_public_key(key_id, deadline)
            .await
            .map_err(KeyFetchError::Authority)?;

        PublicKeyRecord::from_pem(key_id, &response.pem)
    }

    /// Whether a key is cached for `key_id`.
    pub async fn contains(&self, key_id: &str) -> bool {
        self.keys.read().await.contains_key(key_id)
    }

    /// Number of cached keys.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }
}
