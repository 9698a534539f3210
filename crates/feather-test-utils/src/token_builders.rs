//! Builder patterns for test session tokens
//!
//! Provides a fluent API for creating signed (or deliberately broken)
//! Feather session tokens.

use crate::crypto_fixtures::{SIGNING_KEY_1_PEM, TEST_KEY_ID_1};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey};
use serde_json::{json, Map, Value};

/// Builder for signed session tokens
///
/// Defaults produce a current, authenticated token that verifies against
/// the first fixture key under [`TEST_KEY_ID_1`]. The header `alg` can be
/// set to anything; the signature is always RS256.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .session_id("SES_alice")
///     .user_id("USR_alice")
///     .expired()
///     .build();
/// ```
pub struct TestTokenBuilder {
    header: Map<String, Value>,
    claims: Map<String, Value>,
    signing_key_pem: &'static str,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();

        let mut header = Map::new();
        header.insert("alg".to_string(), json!("RS256"));
        header.insert("typ".to_string(), json!("JWT"));
        header.insert("kid".to_string(), json!(TEST_KEY_ID_1));

        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!("feather.id"));
        claims.insert("sub".to_string(), json!("USR_test"));
        claims.insert("aud".to_string(), json!("PRJ_test"));
        claims.insert("ses".to_string(), json!("SES_test"));
        claims.insert("typ".to_string(), json!("authenticated"));
        claims.insert(
            "cat".to_string(),
            json!((now - Duration::seconds(60)).timestamp()),
        );
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );

        Self {
            header,
            claims,
            signing_key_pem: SIGNING_KEY_1_PEM,
        }
    }

    /// Set the session ID (`ses`)
    pub fn session_id(self, session_id: &str) -> Self {
        self.with_claim("ses", json!(session_id))
    }

    /// Set the user ID (`sub`)
    pub fn user_id(self, user_id: &str) -> Self {
        self.with_claim("sub", json!(user_id))
    }

    /// Set the project ID (`aud`)
    pub fn project_id(self, project_id: &str) -> Self {
        self.with_claim("aud", json!(project_id))
    }

    /// Set the issuer (`iss`)
    pub fn issuer(self, issuer: &str) -> Self {
        self.with_claim("iss", json!(issuer))
    }

    /// Set the session type (`typ`)
    pub fn session_type(self, session_type: &str) -> Self {
        self.with_claim("typ", json!(session_type))
    }

    /// Set the creation timestamp (`cat`, Unix seconds)
    pub fn created_at(self, timestamp: i64) -> Self {
        self.with_claim("cat", json!(timestamp))
    }

    /// Set the expiry timestamp (`exp`, Unix seconds)
    pub fn expires_at(self, timestamp: i64) -> Self {
        self.with_claim("exp", json!(timestamp))
    }

    /// Expire the token ten minutes ago
    pub fn expired(self) -> Self {
        let exp = (Utc::now() - Duration::seconds(600)).timestamp();
        self.expires_at(exp)
    }

    /// Set any claim to any JSON value
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Drop a claim entirely
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Set the header `alg` (signing stays RS256)
    pub fn algorithm(mut self, alg: &str) -> Self {
        self.header.insert("alg".to_string(), json!(alg));
        self
    }

    /// Set the header `kid`
    pub fn key_id(mut self, key_id: &str) -> Self {
        self.header.insert("kid".to_string(), json!(key_id));
        self
    }

    /// Drop the header `kid`
    pub fn without_key_id(mut self) -> Self {
        self.header.remove("kid");
        self
    }

    /// Sign with a different PKCS#1 private key
    pub fn signed_with(mut self, signing_key_pem: &'static str) -> Self {
        self.signing_key_pem = signing_key_pem;
        self
    }

    /// Encode and sign the token
    ///
    /// # Panics
    ///
    /// Panics if the signing key is not a valid RSA private key.
    pub fn build(self) -> String {
        let header = URL_SAFE_NO_PAD.encode(Value::Object(self.header).to_string());
        let claims = URL_SAFE_NO_PAD.encode(Value::Object(self.claims).to_string());
        let message = format!("{header}.{claims}");

        let key = EncodingKey::from_rsa_pem(self.signing_key_pem.as_bytes())
            .expect("fixture signing key should parse");
        let signature = jsonwebtoken::crypto::sign(message.as_bytes(), &key, Algorithm::RS256)
            .expect("RS256 signing should succeed");

        format!("{message}.{signature}")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the first character of the signature segment so the signature
/// no longer matches while the token stays well-formed.
pub fn tamper_signature(token: &str) -> String {
    let (signed, signature) = token
        .rsplit_once('.')
        .expect("token should have a signature segment");
    let mut chars = signature.chars();
    let first = chars.next().expect("signature should not be empty");
    let replacement = if first == 'A' { 'B' } else { 'A' };
    format!("{signed}.{replacement}{}", chars.as_str())
}
