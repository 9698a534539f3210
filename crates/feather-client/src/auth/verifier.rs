//! Session token verifier.
//!
//! Runs a token through the codec and the claim validator, then either
//! assembles the session locally or hands an expired one to revalidation.

use crate::auth::assembler::SessionAssembler;
use crate::auth::claims::{ClaimValidator, ClaimsOutcome};
use crate::auth::codec::TokenCodec;
use crate::auth::public_keys::PublicKeyCache;
use crate::auth::revalidation::RevalidationCoordinator;
use crate::auth::TokenRejection;
use crate::errors::FeatherError;
use crate::gateway::Gateway;
use crate::models::Session;
use crate::observability::metrics::{record_session_validation, ValidationOutcome};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Verifies Feather session tokens.
///
/// Cheap to share behind an `Arc`; the key cache is the only mutable state.
pub struct SessionVerifier {
    codec: TokenCodec,
    validator: ClaimValidator,
    revalidation: RevalidationCoordinator,
}

impl SessionVerifier {
    /// Create a verifier over an existing key cache and gateway.
    pub fn new(keys: Arc<PublicKeyCache>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            codec: TokenCodec::new(keys),
            validator: ClaimValidator::new(),
            revalidation: RevalidationCoordinator::new(gateway),
        }
    }

    /// Key cache used by this verifier.
    pub fn keys(&self) -> &Arc<PublicKeyCache> {
        self.codec.keys()
    }

    /// Validate a session token.
    ///
    /// # Errors
    ///
    /// - `FeatherError::InvalidToken` for every local verification failure
    /// - any gateway error, unchanged, when an expired token cannot be
    ///   revalidated
    pub async fn validate(&self, token: &str) -> Result<Session, FeatherError> {
        self.validate_with_deadline(token, None).await
    }

    /// Validate a session token, bounding any key fetch or revalidation
    /// request by `deadline`.
    ///
    /// # Errors
    ///
    /// Same as [`SessionVerifier::validate`]. A passed deadline during key
    /// lookup is an invalid token; during revalidation it is a transport error.
    #[instrument(skip_all)]
    pub async fn validate_with_deadline(
        &self,
        token: &str,
        deadline: Option<Instant>,
    ) -> Result<Session, FeatherError> {
        let outcome = match self.verify_locally(token, deadline).await {
            Ok(outcome) => outcome,
            Err(rejection) => {
                debug!(
                    target: "feather.auth.verifier",
                    reason = rejection.reason(),
                    "Session token rejected"
                );
                record_session_validation(ValidationOutcome::Invalid);
                return Err(rejection.into());
            }
        };

        match outcome {
            ClaimsOutcome::Current(draft) => {
                debug!(target: "feather.auth.verifier", session_id = %draft.session_id, "Session token verified locally");
                record_session_validation(ValidationOutcome::Active);
                Ok(SessionAssembler::assemble(draft, token))
            }
            ClaimsOutcome::Expired(draft) => {
                match self.revalidation.revalidate(&draft, token, deadline).await {
                    Ok(session) => {
                        record_session_validation(ValidationOutcome::Revalidated);
                        Ok(session)
                    }
                    Err(e) => {
                        record_session_validation(ValidationOutcome::AuthorityError);
                        Err(e)
                    }
                }
            }
        }
    }

    async fn verify_locally(
        &self,
        token: &str,
        deadline: Option<Instant>,
    ) -> Result<ClaimsOutcome, TokenRejection> {
        if token.is_empty() {
            return Err(TokenRejection::Empty);
        }

        let claims = self.codec.parse_and_verify(token, deadline).await?;
        self.validator.validate(&claims)
    }
}
