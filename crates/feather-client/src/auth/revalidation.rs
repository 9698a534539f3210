//! Revalidation of locally expired session tokens.
//!
//! A token whose only fault is a passed `exp` is sent back to the API, which
//! decides whether the session is still active. The API's answer is final,
//! including an `expired` or `revoked` status, and its errors reach the
//! caller unchanged.

use crate::auth::claims::SessionDraft;
use crate::errors::FeatherError;
use crate::gateway::Gateway;
use crate::models::Session;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Asks the API about sessions whose tokens expired locally.
pub struct RevalidationCoordinator {
    gateway: Arc<dyn Gateway>,
}

impl RevalidationCoordinator {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Confirm the session named by `draft`, presenting the original token.
    ///
    /// The expired token itself is re-sent; no fresh token is requested.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error unchanged.
    #[instrument(skip_all, fields(session_id = %draft.session_id))]
    pub async fn revalidate(
        &self,
        draft: &SessionDraft,
        original_token: &str,
        deadline: Option<Instant>,
    ) -> Result<Session, FeatherError> {
        match self
            .gateway
            .validate_session(&draft.session_id, original_token, deadline)
            .await
        {
            Ok(session) => {
                info!(
                    target: "feather.auth.revalidation",
                    session_id = %session.id,
                    status = session.status.as_str(),
                    "Session revalidated by API"
                );
                Ok(session)
            }
            Err(e) => {
                warn!(
                    target: "feather.auth.revalidation",
                    session_id = %draft.session_id,
                    error = %e,
                    "Session revalidation failed"
                );
                Err(e)
            }
        }
    }
}
