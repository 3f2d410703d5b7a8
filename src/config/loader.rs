//! Configuration loading from the environment.
//!
//! # Responsibilities
//! - Read `MGM_TARGET_URL` and `PORT`, falling back to defaults
//! - Validate the upstream URL before the process accepts traffic
//!
//! # Design Decisions
//! - Validation is a pure function over the raw values so tests never
//!   touch process-wide environment state

use std::env;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, DEFAULT_PORT, DEFAULT_UPSTREAM, UPSTREAM_TIMEOUT};

/// Error type for configuration loading. Any variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid MGM_TARGET_URL {url:?}: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("invalid PORT {0:?}: must be a number in 1-65535")]
    InvalidPort(String),
}

/// Load and validate configuration from environment variables.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    build(env::var("MGM_TARGET_URL").ok(), env::var("PORT").ok())
}

/// Build a validated config from raw values, `None` meaning unset.
pub fn build(target_url: Option<String>, port: Option<String>) -> Result<ProxyConfig, ConfigError> {
    let upstream_base = match target_url {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_UPSTREAM.to_string(),
    };
    validate_upstream(&upstream_base)?;

    let port = match port {
        Some(raw) if !raw.is_empty() => raw
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort(raw))?,
        _ => DEFAULT_PORT,
    };

    Ok(ProxyConfig {
        upstream_base,
        bind_address: format!("0.0.0.0:{port}"),
        upstream_timeout: UPSTREAM_TIMEOUT,
    })
}

/// Require an absolute URI with scheme and authority. The path and
/// query of each inbound request are appended verbatim, so anything
/// less would produce unroutable outbound targets on every request.
fn validate_upstream(url: &str) -> Result<(), ConfigError> {
    let uri = url
        .parse::<Uri>()
        .map_err(|e| ConfigError::InvalidUpstreamUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ConfigError::InvalidUpstreamUrl {
            url: url.to_string(),
            reason: "missing scheme or host".to_string(),
        });
    }

    Ok(())
}
