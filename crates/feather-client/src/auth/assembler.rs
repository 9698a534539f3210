//! Session assembly from validated claims.

use crate::auth::claims::SessionDraft;
use crate::models::{session_object, Session, SessionStatus};

/// Builds the public [`Session`] for a token that verified locally.
pub struct SessionAssembler;

impl SessionAssembler {
    /// Map a current draft and its token to an active session.
    ///
    /// Only a freshly verified, unexpired token reaches this point, so the
    /// status is always `active` and `revoked_at` is always empty.
    pub fn assemble(draft: SessionDraft, token: &str) -> Session {
        Session {
            id: draft.session_id,
            object: session_object(),
            session_type: draft.session_type,
            status: SessionStatus::Active,
            token: Some(token.to_string()),
            user_id: draft.user_id,
            created_at: draft.created_at,
            revoked_at: None,
        }
    }
}
