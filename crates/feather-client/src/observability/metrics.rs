//! Metrics definitions for the Feather client.
//!
//! All metrics follow Prometheus naming conventions:
//! - `feather_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: 4 values (active, revalidated, invalid, authority_error)
//! - `result`: 2 values (hit, miss)
//! - `method`: GET or POST
//! - `endpoint`: resource paths with identifiers replaced by `{id}`
//! - `status`: 3 values (success, error, timeout)

use metrics::{counter, histogram};
use std::time::Duration;

// ============================================================================
// Session Validation Metrics
// ============================================================================

/// Final outcome of one `validate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Verified locally, token still current.
    Active,
    /// Expired locally, answered by the authority.
    Revalidated,
    /// Rejected locally.
    Invalid,
    /// Revalidation failed at the authority or transport.
    AuthorityError,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Active => "active",
            ValidationOutcome::Revalidated => "revalidated",
            ValidationOutcome::Invalid => "invalid",
            ValidationOutcome::AuthorityError => "authority_error",
        }
    }
}

/// Record a session validation outcome
///
/// Metric: `feather_session_validations_total`
/// Labels: `outcome`
pub fn record_session_validation(outcome: ValidationOutcome) {
    counter!("feather_session_validations_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

// ============================================================================
// Public Key Cache Metrics
// ============================================================================

/// Record a public key cache lookup
///
/// Metric: `feather_public_key_cache_lookups_total`
/// Labels: `result` (hit, miss)
pub fn record_key_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };

    counter!("feather_public_key_cache_lookups_total",
        "result" => result
    )
    .increment(1);
}

/// Record a public key fetch from the authority
///
/// Metric: `feather_public_key_fetches_total`
/// Labels: `status` (success, error)
pub fn record_key_fetch(success: bool) {
    let status = if success { "success" } else { "error" };

    counter!("feather_public_key_fetches_total",
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Gateway Metrics
// ============================================================================

/// Record a gateway request completion
///
/// Metric: `feather_gateway_requests_total`, `feather_gateway_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// `status_code` is `None` when no response arrived (connect failure, timeout).
pub fn record_gateway_request(
    method: &str,
    path: &str,
    status_code: Option<u16>,
    duration: Duration,
) {
    let endpoint = normalize_endpoint(path);
    let status = categorize_status_code(status_code);

    histogram!("feather_gateway_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint.clone(),
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("feather_gateway_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: Option<u16>) -> &'static str {
    match status_code {
        Some(200..=299) => "success",
        Some(408 | 504) | None => "timeout",
        Some(_) => "error",
    }
}

/// Normalize an endpoint path to prevent label cardinality explosion
///
/// The second segment of every known resource path is an identifier and is
/// replaced with `{id}`. Unknown roots collapse to `/other`.
fn normalize_endpoint(path: &str) -> String {
    const RESOURCES: [&str; 4] = ["credentials", "publicKeys", "sessions", "users"];

    let mut segments = path.trim_matches('/').split('/');
    let root = match segments.next() {
        Some(root) if RESOURCES.contains(&root) => root,
        _ => return "/other".to_string(),
    };

    match (segments.next(), segments.next(), segments.next()) {
        (None, _, _) => format!("/{root}"),
        (Some(_), None, _) => format!("/{root}/{{id}}"),
        (Some(_), Some(action), None) if action == "validate" || action == "upgrade" => {
            format!("/{root}/{{id}}/{action}")
        }
        _ => "/other".to_string(),
    }
}
