//! In-memory implementations of the client seams.
//!
//! - [`MockKeyAuthority`] serves PEM keys from a map and counts fetches
//! - [`MockGateway`] answers revalidation with a configured result and
//!   records every call
//!
//! # Example
//!
//! ```rust,ignore
//! use feather_test_utils::*;
//!
//! let authority = Arc::new(
//!     MockKeyAuthority::new().with_key(TEST_KEY_ID_1, PUBLIC_KEY_1_PKIX_PEM),
//! );
//! let gateway = Arc::new(MockGateway::returning_session(revoked_session("SES_test")));
//! ```

use async_trait::async_trait;
use chrono::Utc;
use feather_client::errors::FeatherError;
use feather_client::gateway::{Gateway, KeyAuthority, PublicKeyResponse};
use feather_client::models::{Session, SessionStatus, SessionType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key authority backed by a map of key ID to PEM (or to a canned error).
///
/// Unknown key IDs answer with a 404 `resource_missing` API error.
#[derive(Debug, Default)]
pub struct MockKeyAuthority {
    keys: HashMap<String, Result<String, FeatherError>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
    fetches_by_key: Mutex<HashMap<String, usize>>,
}

impl MockKeyAuthority {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pem` for `key_id`.
    #[must_use]
    pub fn with_key(mut self, key_id: &str, pem: &str) -> Self {
        self.keys.insert(key_id.to_string(), Ok(pem.to_string()));
        self
    }

    /// Answer fetches for `key_id` with `error`.
    #[must_use]
    pub fn with_error(mut self, key_id: &str, error: FeatherError) -> Self {
        self.keys.insert(key_id.to_string(), Err(error));
        self
    }

    /// Sleep before answering, to widen race windows.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total number of fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches for one key ID.
    pub fn fetch_count_for(&self, key_id: &str) -> usize {
        self.fetches_by_key
            .lock()
            .unwrap()
            .get(key_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl KeyAuthority for MockKeyAuthority {
    async fn fetch_public_key(
        &self,
        key_id: &str,
        _deadline: Option<Instant>,
    ) -> Result<PublicKeyResponse, FeatherError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self
            .fetches_by_key
            .lock()
            .unwrap()
            .entry(key_id.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.keys.get(key_id) {
            Some(Ok(pem)) => Ok(PublicKeyResponse {
                id: key_id.to_string(),
                object: "publicKey".to_string(),
                pem: pem.clone(),
            }),
            Some(Err(error)) => Err(error.clone()),
            None => Err(not_found(key_id)),
        }
    }
}

/// Gateway that answers every revalidation with one configured result.
#[derive(Debug)]
pub struct MockGateway {
    result: Result<Session, FeatherError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockGateway {
    /// Answer every revalidation with `session`.
    #[must_use]
    pub fn returning_session(session: Session) -> Self {
        Self {
            result: Ok(session),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every revalidation with `error`.
    #[must_use]
    pub fn returning_error(error: FeatherError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Gateway for tests that must never reach revalidation.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::returning_error(FeatherError::Transport(
            "revalidation not expected".to_string(),
        ))
    }

    /// Recorded `(session_id, session_token)` pairs, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn validate_session(
        &self,
        session_id: &str,
        session_token: &str,
        _deadline: Option<Instant>,
    ) -> Result<Session, FeatherError> {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), session_token.to_string()));
        self.result.clone()
    }
}

/// A revoked authenticated session, as the API returns after a logout.
pub fn revoked_session(session_id: &str) -> Session {
    let now = Utc::now();
    Session {
        id: session_id.to_string(),
        object: "session".to_string(),
        session_type: SessionType::authenticated(),
        status: SessionStatus::Revoked,
        token: None,
        user_id: "USR_test".to_string(),
        created_at: now - chrono::Duration::hours(2),
        revoked_at: Some(now),
    }
}

/// The 404 error the API returns for an unknown object.
pub fn not_found(id: &str) -> FeatherError {
    FeatherError::Api {
        status: 404,
        error: feather_client::errors::ApiError {
            object: "error".to_string(),
            error_type: "invalid_request_error".to_string(),
            code: "resource_missing".to_string(),
            message: format!("No such object: '{id}'"),
        },
    }
}
