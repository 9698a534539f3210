//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] so every crate in the workspace names secrets the
//! same way. The Feather API key and session tokens held in configuration
//! are `SecretString`s: `Debug` prints a redaction marker and reading the
//! value requires an explicit `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct ApiCredentials {
//!     project: String,
//!     api_key: SecretString,
//! }
//!
//! let creds = ApiCredentials {
//!     project: "PRJ_demo".to_string(),
//!     api_key: SecretString::from("live_abc123"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("live_abc123"));
//! assert_eq!(creds.api_key.expose_secret(), "live_abc123");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
