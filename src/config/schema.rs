//! Configuration schema definitions.

use std::time::Duration;

/// Upstream used when `MGM_TARGET_URL` is not set.
pub const DEFAULT_UPSTREAM: &str = "https://ingestion.mostlygoodmetrics.com";

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8080;

/// End-to-end bound on each outbound call, covering connect through
/// the full response.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable proxy configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upstream base URL all non-probe requests are forwarded to.
    /// Used as-is: the original path and query are concatenated onto it.
    pub upstream_base: String,

    /// Listener bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Timeout for each outbound call.
    pub upstream_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_base: DEFAULT_UPSTREAM.to_string(),
            bind_address: format!("0.0.0.0:{DEFAULT_PORT}"),
            upstream_timeout: UPSTREAM_TIMEOUT,
        }
    }
}
