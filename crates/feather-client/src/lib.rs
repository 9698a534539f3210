//! Feather client library.
//!
//! Client for the Feather identity API with local session token
//! verification:
//!
//! - Session tokens (RS256) are verified against cached public keys,
//!   without a network round trip once the key is known
//! - Tokens past their expiry are confirmed with the API instead of being
//!   rejected outright
//! - Credentials, sessions and users are available as resource clients
//!
//! # Modules
//!
//! - `auth` - Session token verification
//! - `client` - Client wiring
//! - `config` - Client configuration from environment
//! - `errors` - Error types
//! - `gateway` - HTTP transport and the key authority / gateway seams
//! - `models` - API objects
//! - `observability` - Metrics
//! - `resources` - Credentials, sessions and users
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), feather_client::FeatherError> {
//! let client = feather_client::Client::with_api_key("live_abc123")?;
//! let session = client.sessions().validate("eyJhbGciOi...").await?;
//! println!("{} is {}", session.id, session.status.as_str());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod observability;
pub mod resources;

pub use client::Client;
pub use config::{Config, ConfigError};
pub use errors::{ApiError, FeatherError};
pub use models::{Session, SessionStatus, SessionType};
