//! Logging configuration shared by Feather binaries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "feather_client=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    Text,
    /// One JSON object per event.
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive (e.g. `feather_client=debug,common=debug`)
    pub log_filter: String,
    /// Output format for log events
    pub log_format: LogFormat,
}

impl ObservabilityConfig {
    /// Load from a variable map (`RUST_LOG`, `FEATHER_LOG_FORMAT`).
    ///
    /// Unknown formats fall back to text; logging setup must never prevent startup.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_filter = vars
            .get("RUST_LOG")
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_format = match vars.get("FEATHER_LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            Some(format) if format == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            log_filter,
            log_format,
        }
    }

    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }
}
