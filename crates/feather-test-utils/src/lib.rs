//! # Feather Test Utilities
//!
//! Shared test utilities for the Feather client.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed RSA keys for reproducible signatures)
//! - Session token builder (TestTokenBuilder)
//! - In-memory key authority and gateway mocks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feather_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let authority = MockKeyAuthority::new()
//!         .with_key(TEST_KEY_ID_1, PUBLIC_KEY_1_PKIX_PEM);
//!
//!     let token = TestTokenBuilder::new()
//!         .session_id("SES_example")
//!         .expired()
//!         .build();
//! }
//! ```

pub mod crypto_fixtures;
pub mod mocks;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use mocks::*;
pub use token_builders::*;
