//! Integration tests for session token validation
//!
//! Drives `SessionVerifier` end to end against the in-memory key authority
//! and gateway, covering rejection paths, the key cache, and revalidation
//! of expired tokens.

use feather_client::auth::public_keys::PublicKeyCache;
use feather_client::auth::verifier::SessionVerifier;
use feather_client::errors::{ApiError, FeatherError};
use feather_client::models::{SessionStatus, SessionType};
use feather_test_utils::{
    not_found, revoked_session, tamper_signature, MockGateway, MockKeyAuthority,
    TestTokenBuilder, PUBLIC_KEY_1_PKCS1_PEM, PUBLIC_KEY_1_PKIX_PEM, PUBLIC_KEY_1_SPKI_PEM,
    PUBLIC_KEY_2_PKCS1_PEM, SIGNING_KEY_1_PEM, SIGNING_KEY_2_PEM, TEST_KEY_ID_1, TEST_KEY_ID_2,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn verifier_with(
    authority: &Arc<MockKeyAuthority>,
    gateway: &Arc<MockGateway>,
) -> SessionVerifier {
    let keys = Arc::new(PublicKeyCache::new(authority.clone()));
    SessionVerifier::new(keys, gateway.clone())
}

fn standard_authority() -> Arc<MockKeyAuthority> {
    Arc::new(
        MockKeyAuthority::new()
            .with_key(TEST_KEY_ID_1, PUBLIC_KEY_1_PKIX_PEM)
            .with_key(TEST_KEY_ID_2, PUBLIC_KEY_2_PKCS1_PEM),
    )
}

// ============================================================================
// Rejections before any network call
// ============================================================================

/// HS256 in the header is rejected without fetching a key.
#[tokio::test]
async fn test_hs256_token_rejected_without_network() -> Result<(), anyhow::Error> {
    // Arrange
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().algorithm("HS256").build();

    // Act
    let result = verifier.validate(&token).await;

    // Assert
    assert_eq!(result, Err(FeatherError::InvalidToken));
    assert_eq!(authority.fetch_count(), 0, "No key fetch for HS256");
    assert_eq!(gateway.call_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_every_unsupported_algorithm_skips_key_fetch() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    for alg in ["none", "HS512", "RS384", "PS256", "ES256", "EdDSA", ""] {
        let token = TestTokenBuilder::new().algorithm(alg).build();
        assert_eq!(
            verifier.validate(&token).await,
            Err(FeatherError::InvalidToken),
            "alg {alg:?} should be rejected"
        );
    }

    assert_eq!(authority.fetch_count(), 0);
    Ok(())
}

/// A header without `kid` is rejected without fetching a key.
#[tokio::test]
async fn test_missing_kid_rejected_without_network() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().without_key_id().build();

    assert_eq!(
        verifier.validate(&token).await,
        Err(FeatherError::InvalidToken)
    );
    assert_eq!(authority.fetch_count(), 0);
    assert_eq!(gateway.call_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_garbage_tokens_are_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let oversized = "a".repeat(9000);

    for token in ["", "not-a-token", "a.b", "a.b.c.d", "!!!.???.###", oversized.as_str()] {
        assert_eq!(
            verifier.validate(token).await,
            Err(FeatherError::InvalidToken)
        );
    }

    assert_eq!(authority.fetch_count(), 0);
    Ok(())
}

// ============================================================================
// Signature and key failures
// ============================================================================

#[tokio::test]
async fn test_tampered_signature_is_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = tamper_signature(&TestTokenBuilder::new().build());

    assert_eq!(
        verifier.validate(&token).await,
        Err(FeatherError::InvalidToken)
    );
    Ok(())
}

/// Token names key 2 but was signed with key 1.
#[tokio::test]
async fn test_token_signed_by_wrong_key_is_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .key_id(TEST_KEY_ID_2)
        .signed_with(SIGNING_KEY_1_PEM)
        .build();

    assert_eq!(
        verifier.validate(&token).await,
        Err(FeatherError::InvalidToken)
    );
    Ok(())
}

/// A 404 from the key endpoint is reported as an invalid token, not as the
/// API error.
#[tokio::test]
async fn test_unknown_key_id_is_invalid_token() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().key_id("PUB_unknown").build();

    let result = verifier.validate(&token).await;

    assert_eq!(result, Err(FeatherError::InvalidToken));
    assert_eq!(authority.fetch_count_for("PUB_unknown"), 1);
    Ok(())
}

#[tokio::test]
async fn test_key_authority_outage_is_invalid_token() -> Result<(), anyhow::Error> {
    let authority = Arc::new(MockKeyAuthority::new().with_error(
        TEST_KEY_ID_1,
        FeatherError::Transport("connection reset".to_string()),
    ));
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    let result = verifier.validate(&TestTokenBuilder::new().build()).await;

    assert_eq!(result, Err(FeatherError::InvalidToken));
    Ok(())
}

/// The key endpoint answering with a private key block is rejected.
#[tokio::test]
async fn test_private_key_pem_is_invalid_token() -> Result<(), anyhow::Error> {
    let authority = Arc::new(MockKeyAuthority::new().with_key(TEST_KEY_ID_1, SIGNING_KEY_1_PEM));
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    let result = verifier.validate(&TestTokenBuilder::new().build()).await;

    assert_eq!(result, Err(FeatherError::InvalidToken));
    assert!(verifier.keys().is_empty().await, "Rejected key must not be cached");
    Ok(())
}

#[tokio::test]
async fn test_generic_public_key_label_is_invalid_token() -> Result<(), anyhow::Error> {
    let authority =
        Arc::new(MockKeyAuthority::new().with_key(TEST_KEY_ID_1, PUBLIC_KEY_1_SPKI_PEM));
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    let result = verifier.validate(&TestTokenBuilder::new().build()).await;

    assert_eq!(result, Err(FeatherError::InvalidToken));
    Ok(())
}

/// Failed lookups are not cached, so a later call fetches again.
#[tokio::test]
async fn test_failed_key_lookup_is_retried() -> Result<(), anyhow::Error> {
    let authority = Arc::new(MockKeyAuthority::new().with_error(TEST_KEY_ID_1, not_found(TEST_KEY_ID_1)));
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().build();

    let _ = verifier.validate(&token).await;
    let _ = verifier.validate(&token).await;

    assert_eq!(authority.fetch_count(), 2);
    Ok(())
}

// ============================================================================
// Claim checks
// ============================================================================

#[tokio::test]
async fn test_wrong_issuer_is_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().issuer("foo").build();

    assert_eq!(
        verifier.validate(&token).await,
        Err(FeatherError::InvalidToken)
    );
    Ok(())
}

#[tokio::test]
async fn test_each_missing_claim_is_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    for claim in ["iss", "sub", "aud", "ses", "typ", "cat", "exp"] {
        let token = TestTokenBuilder::new().without_claim(claim).build();
        assert_eq!(
            verifier.validate(&token).await,
            Err(FeatherError::InvalidToken),
            "token without {claim} should be invalid"
        );
    }

    assert_eq!(gateway.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_claim_values_are_invalid() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    let cases = [
        ("sub", json!("user_123")),
        ("sub", json!(42)),
        ("aud", json!("PROJ_123")),
        ("ses", json!("SESS_123")),
        ("typ", json!("")),
        ("typ", json!(1)),
        ("cat", json!("1700000000")),
        ("exp", json!(null)),
    ];

    for (claim, value) in cases {
        let token = TestTokenBuilder::new().with_claim(claim, value.clone()).build();
        assert_eq!(
            verifier.validate(&token).await,
            Err(FeatherError::InvalidToken),
            "{claim} = {value} should be invalid"
        );
    }

    Ok(())
}

/// An expired token with a bad claim is rejected, never revalidated.
#[tokio::test]
async fn test_expired_token_with_bad_claim_is_not_revalidated() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::returning_session(revoked_session("SES_test")));
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().expired().project_id("bad").build();

    assert_eq!(
        verifier.validate(&token).await,
        Err(FeatherError::InvalidToken)
    );
    assert_eq!(gateway.call_count(), 0);
    Ok(())
}

// ============================================================================
// Current tokens
// ============================================================================

#[tokio::test]
async fn test_current_token_builds_active_session() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .session_id("SES_alice")
        .user_id("USR_alice")
        .session_type("anonymous")
        .created_at(1_700_000_000)
        .build();

    let session = verifier.validate(&token).await?;

    assert_eq!(session.id, "SES_alice");
    assert_eq!(session.object, "session");
    assert_eq!(session.user_id, "USR_alice");
    assert_eq!(session.session_type, SessionType::anonymous());
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.created_at.timestamp(), 1_700_000_000);
    assert_eq!(session.token.as_deref(), Some(token.as_str()));
    assert!(session.revoked_at.is_none());
    assert_eq!(gateway.call_count(), 0);

    Ok(())
}

/// Fractional timestamps are truncated to whole seconds.
#[tokio::test]
async fn test_fractional_created_at_is_truncated() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .with_claim("cat", json!(1_700_000_000.9))
        .build();

    let session = verifier.validate(&token).await?;

    assert_eq!(session.created_at.timestamp(), 1_700_000_000);
    Ok(())
}

#[tokio::test]
async fn test_pkcs1_and_pkix_keys_both_verify() -> Result<(), anyhow::Error> {
    for pem in [PUBLIC_KEY_1_PKIX_PEM, PUBLIC_KEY_1_PKCS1_PEM] {
        let authority = Arc::new(MockKeyAuthority::new().with_key(TEST_KEY_ID_1, pem));
        let gateway = Arc::new(MockGateway::unreachable());
        let verifier = verifier_with(&authority, &gateway);

        let session = verifier.validate(&TestTokenBuilder::new().build()).await?;
        assert_eq!(session.id, "SES_test");
    }
    Ok(())
}

#[tokio::test]
async fn test_second_key_verifies_its_own_tokens() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .key_id(TEST_KEY_ID_2)
        .signed_with(SIGNING_KEY_2_PEM)
        .build();

    assert!(verifier.validate(&token).await.is_ok());
    assert_eq!(authority.fetch_count_for(TEST_KEY_ID_2), 1);
    assert_eq!(authority.fetch_count_for(TEST_KEY_ID_1), 0);
    Ok(())
}

// ============================================================================
// Key cache
// ============================================================================

#[tokio::test]
async fn test_validation_is_idempotent_with_warm_cache() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().build();

    let first = verifier.validate(&token).await?;
    let fetches_after_first = authority.fetch_count();
    let second = verifier.validate(&token).await?;

    assert_eq!(first, second);
    assert_eq!(authority.fetch_count(), fetches_after_first);
    Ok(())
}

#[tokio::test]
async fn test_unseen_key_fetched_exactly_once() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = verifier_with(&authority, &gateway);

    verifier
        .validate(&TestTokenBuilder::new().session_id("SES_one").build())
        .await?;
    assert_eq!(authority.fetch_count_for(TEST_KEY_ID_1), 1);

    verifier
        .validate(&TestTokenBuilder::new().session_id("SES_two").build())
        .await?;
    assert_eq!(authority.fetch_count_for(TEST_KEY_ID_1), 1);
    assert!(verifier.keys().contains(TEST_KEY_ID_1).await);

    Ok(())
}

/// Separate caches do not share keys.
#[tokio::test]
async fn test_caches_are_isolated() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::unreachable());
    let first = verifier_with(&authority, &gateway);
    let second = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().build();

    first.validate(&token).await?;
    second.validate(&token).await?;

    assert_eq!(authority.fetch_count_for(TEST_KEY_ID_1), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_validations_share_one_cache() -> Result<(), anyhow::Error> {
    // Arrange - slow key authority so that the first misses overlap
    let authority = Arc::new(
        MockKeyAuthority::new()
            .with_key(TEST_KEY_ID_1, PUBLIC_KEY_1_PKIX_PEM)
            .with_delay(Duration::from_millis(50)),
    );
    let gateway = Arc::new(MockGateway::unreachable());
    let verifier = Arc::new(verifier_with(&authority, &gateway));

    // Act
    let tasks = (0..16).map(|i| {
        let verifier = Arc::clone(&verifier);
        let token = TestTokenBuilder::new()
            .session_id(&format!("SES_concurrent_{i}"))
            .build();
        tokio::spawn(async move { verifier.validate(&token).await })
    });
    let results = futures::future::join_all(tasks).await;

    // Assert
    for (i, joined) in results.into_iter().enumerate() {
        let session = joined??;
        assert_eq!(session.id, format!("SES_concurrent_{i}"));
    }
    assert_eq!(verifier.keys().len().await, 1);
    assert!(authority.fetch_count() >= 1);

    // Once warm, no further fetches
    let warm = authority.fetch_count();
    verifier.validate(&TestTokenBuilder::new().build()).await?;
    assert_eq!(authority.fetch_count(), warm);

    Ok(())
}

// ============================================================================
// Expired tokens
// ============================================================================

/// The API's answer for an expired token is returned as is, even when the
/// session is revoked.
#[tokio::test]
async fn test_expired_token_returns_revoked_session_from_api() -> Result<(), anyhow::Error> {
    // Arrange
    let authority = standard_authority();
    let revoked = revoked_session("SES_expired");
    let gateway = Arc::new(MockGateway::returning_session(revoked.clone()));
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .session_id("SES_expired")
        .expired()
        .build();

    // Act
    let session = verifier.validate(&token).await?;

    // Assert
    assert_eq!(session, revoked);
    assert_eq!(session.status, SessionStatus::Revoked);
    assert_eq!(
        gateway.calls(),
        vec![("SES_expired".to_string(), token.clone())],
        "Exactly one revalidation with the original token"
    );

    Ok(())
}

/// `exp` equal to now counts as expired.
#[tokio::test]
async fn test_token_expiring_now_is_revalidated() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let gateway = Arc::new(MockGateway::returning_session(revoked_session("SES_test")));
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new()
        .expires_at(chrono::Utc::now().timestamp())
        .build();

    verifier.validate(&token).await?;

    assert_eq!(gateway.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_revalidation_api_error_is_propagated_unchanged() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let rate_limited = FeatherError::Api {
        status: 429,
        error: ApiError {
            object: "error".to_string(),
            error_type: "rate_limit_error".to_string(),
            code: "rate_limit_exceeded".to_string(),
            message: "Too many requests".to_string(),
        },
    };
    let gateway = Arc::new(MockGateway::returning_error(rate_limited.clone()));
    let verifier = verifier_with(&authority, &gateway);
    let token = TestTokenBuilder::new().expired().build();

    let result = verifier.validate(&token).await;

    assert_eq!(result, Err(rate_limited));
    assert_eq!(gateway.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_revalidation_expired_error_is_propagated() -> Result<(), anyhow::Error> {
    let authority = standard_authority();
    let expired = FeatherError::Api {
        status: 400,
        error: ApiError {
            object: "error".to_string(),
            error_type: "validation_error".to_string(),
            code: "session_token_expired".to_string(),
            message: "The session token has expired".to_string(),
        },
    };
    let gateway = Arc::new(MockGateway::returning_error(expired.clone()));
    let verifier = verifier_with(&authority, &gateway);

    let result = verifier
        .validate(&TestTokenBuilder::new().expired().build())
        .await;

    let err = result.unwrap_err();
    assert_eq!(err, expired);
    assert_eq!(err.code(), Some("session_token_expired"));
    Ok(())
}
